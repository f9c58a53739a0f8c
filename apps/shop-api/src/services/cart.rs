//! Cart operations for an authenticated customer.
//!
//! Adding never checks stock; checkout is the only gatekeeper for that.

use tracing::{info, warn};

use shop_core::validation::validate_quantity;
use shop_core::{CartLine, CoreError, MAX_CART_LINES, MAX_ITEM_QUANTITY};
use shop_db::{CartRemoval, Database, DbError};

use crate::error::ApiResult;

/// The customer's cart lines, in the order they were first added.
pub async fn view(db: &Database, customer_id: &str) -> ApiResult<Vec<CartLine>> {
    Ok(db.cart().list_for_customer(customer_id).await?)
}

/// Add units of a product, merging into an existing line.
pub async fn add(
    db: &Database,
    customer_id: &str,
    product_id: &str,
    quantity: i64,
) -> ApiResult<CartLine> {
    validate_quantity(quantity)?;

    if db.products().get_by_id(product_id).await?.is_none() {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }

    match db.cart().add(customer_id, product_id, quantity).await {
        Ok(Some(line)) => {
            info!(
                customer_id = %customer_id,
                product_id = %product_id,
                quantity = line.quantity,
                "Cart line updated"
            );
            Ok(line)
        }
        // refused by one of the caps; an existing line means the unit cap
        Ok(None) => match db.cart().find(customer_id, product_id).await? {
            Some(line) => Err(CoreError::QuantityTooLarge {
                requested: line.quantity + quantity,
                max: MAX_ITEM_QUANTITY,
            }
            .into()),
            None => Err(CoreError::CartFull {
                max: MAX_CART_LINES as i64,
            }
            .into()),
        },
        // product deleted between the lookup and the insert
        Err(DbError::ForeignKeyViolation { .. }) => {
            Err(CoreError::ProductNotFound(product_id.to_string()).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove one line, provided `customer_id` owns it.
pub async fn remove(db: &Database, customer_id: &str, line_id: &str) -> ApiResult<()> {
    match db.cart().remove_owned(customer_id, line_id).await? {
        CartRemoval::Removed => {
            info!(customer_id = %customer_id, line_id = %line_id, "Cart line removed");
            Ok(())
        }
        CartRemoval::NotFound => Err(CoreError::CartLineNotFound(line_id.to_string()).into()),
        CartRemoval::Forbidden => {
            warn!(customer_id = %customer_id, line_id = %line_id, "Attempt to remove another customer's cart line");
            Err(CoreError::CartLineForbidden(line_id.to_string()).into())
        }
    }
}

/// Empty the customer's cart; returns the number of lines removed.
pub async fn clear(db: &Database, customer_id: &str) -> ApiResult<u64> {
    let removed = db.cart().clear(customer_id).await?;
    info!(customer_id = %customer_id, removed, "Cart cleared");
    Ok(removed)
}
