//! Back office dashboard.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::domain::aggregates::User;
use crate::error::Result;
use crate::store::Store;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_products: u64,
    pub total_orders: u64,
    /// Customers only; administrators are not counted.
    pub total_users: u64,
    pub total_categories: u64,
    pub total_revenue: Decimal,
}

pub struct AdminService<'a> {
    store: &'a dyn Store,
}

impl<'a> AdminService<'a> {
    pub fn new(store: &'a dyn Store) -> Self { Self { store } }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<Stats> {
        let (total_products, total_orders, total_users, total_categories, total_revenue) = tokio::try_join!(
            self.store.count_products(),
            self.store.count_orders(),
            self.store.count_customers(),
            self.store.count_categories(),
            self.store.total_revenue(),
        )?;
        Ok(Stats { total_products, total_orders, total_users, total_categories, total_revenue })
    }

    /// Customers newest first.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>> { Ok(self.store.customers().await?) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CustomerInfo, Order, OrderLine, Product};
    use crate::domain::aggregates::product::sample;
    use crate::domain::value_objects::Quantity;
    use crate::services::testing;
    use uuid::Uuid;

    fn order_for(product: &Product, quantity: u32) -> Order {
        let line = OrderLine::snapshot(product, Quantity::new(quantity).unwrap());
        Order::place(Uuid::now_v7(), vec![line], CustomerInfo::default()).unwrap()
    }

    #[tokio::test]
    async fn test_stats_on_empty_store() {
        let state = testing::state();
        let stats = AdminService::new(state.store.as_ref()).stats().await.unwrap();
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_stats_and_users() {
        let state = testing::state();
        let p = sample("Tote", 650, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        state.store.insert_order(&order_for(&p, 1)).await.unwrap();
        state.store.insert_order(&order_for(&p, 2)).await.unwrap();
        state.store.insert_user(&User::register("Asha", "asha@example.com", "h".into())).await.unwrap();
        state.store.insert_user(&User::admin("Admin", "admin", "h".into())).await.unwrap();

        let admin = AdminService::new(state.store.as_ref());
        let stats = admin.stats().await.unwrap();
        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_categories, 0);
        assert_eq!(stats.total_revenue, Decimal::new(1950, 0));

        let users = admin.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "asha@example.com");
    }
}
