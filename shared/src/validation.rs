//! Validation utilities for the Stockroom warehouse management system

use rust_decimal::Decimal;

/// Validate a stock quantity (whole units, strictly positive)
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than 0");
    }
    Ok(())
}

/// Validate a unit cost (buying price, strictly positive)
pub fn validate_unit_cost(unit_cost: Decimal) -> Result<(), &'static str> {
    if unit_cost <= Decimal::ZERO {
        return Err("Unit cost must be greater than 0");
    }
    Ok(())
}

/// Validate a selling price (non-negative; free giveaways are allowed)
pub fn validate_selling_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Selling price cannot be negative");
    }
    Ok(())
}

/// Validate an entity name (products, categories, warehouses)
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.len() > 120 {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

/// Validate a stock keeping unit code
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() || sku.len() > 64 {
        return Err("SKU must be between 1 and 64 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("SKU may only contain letters, digits, '-' and '_'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost(Decimal::from(100)).is_ok());
        assert!(validate_unit_cost(Decimal::ZERO).is_err());
        assert!(validate_unit_cost(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_selling_price() {
        assert!(validate_selling_price(Decimal::ZERO).is_ok());
        assert!(validate_selling_price(Decimal::from(150)).is_ok());
        assert!(validate_selling_price(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Rice 5kg").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("RICE-5KG_01").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("bad sku").is_err());
    }
}
