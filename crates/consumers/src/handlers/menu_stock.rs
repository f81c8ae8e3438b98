//! Flips dish availability with the stock of their ingredients.

use async_trait::async_trait;
use common::{Context, MenuItemId};
use domain::inventory::{StockAlertData, StockLevel, StockReceivedData};
use domain::menu::MenuService;
use event_bus::EventEnvelope;

use crate::handler::{EventHandler, Outcome, decode};
use crate::Result;

/// Consumes the inventory alerts and `StockReceived`.
#[derive(Clone)]
pub struct MenuStockHandler {
    menus: MenuService,
}

impl MenuStockHandler {
    pub fn new(menus: MenuService) -> Self {
        Self { menus }
    }

    async fn set_all(
        &self,
        ctx: &Context,
        items: &[MenuItemId],
        available: bool,
    ) -> Result<Outcome> {
        let mut changed = 0;
        for item in items {
            changed += self.menus.set_availability_everywhere(ctx, item, available).await?;
        }
        Ok(if changed > 0 { Outcome::Applied } else { Outcome::Skipped })
    }
}

#[async_trait]
impl EventHandler for MenuStockHandler {
    fn name(&self) -> &'static str {
        "menu_stock"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &["OutOfStockAlert", "LowStockAlert", "StockReceived"]
    }

    async fn handle(&self, ctx: &Context, event: &EventEnvelope) -> Result<Outcome> {
        match event.event_type.as_str() {
            "OutOfStockAlert" => {
                let alert: StockAlertData = decode(event)?;
                self.set_all(ctx, &alert.menu_item_ids, false).await
            }
            "LowStockAlert" => {
                let alert: StockAlertData = decode(event)?;
                tracing::info!(
                    sku = %alert.sku,
                    available = alert.available_stock,
                    minimum = alert.minimum_stock,
                    "stock running low"
                );
                Ok(Outcome::Skipped)
            }
            "StockReceived" => {
                let received: StockReceivedData = decode(event)?;
                if received.level == StockLevel::Out {
                    return Ok(Outcome::Skipped);
                }
                self.set_all(ctx, &received.menu_item_ids, true).await
            }
            _ => Ok(Outcome::Skipped),
        }
    }
}
