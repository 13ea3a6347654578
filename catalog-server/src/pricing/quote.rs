//! Read views and cart quotes

use super::calculator::{
    PriceSummary, PricingResult, cart_total, effective_price, is_wholesale_eligible, line_total,
    to_display_f64,
};
use shared::models::{CartQuote, Product, ProductView, ProductWithCategory, QuotedLine};

/// Attach the derived price fields to a joined product row
pub fn product_view(item: ProductWithCategory) -> PricingResult<ProductView> {
    let summary = PriceSummary::of(&item.product)?;
    Ok(ProductView {
        item,
        effective_price: summary.effective_price,
        has_discount: summary.has_discount,
    })
}

/// Price every line and the total, keeping the request's line order
pub fn quote_cart(lines: &[(&Product, i32)]) -> PricingResult<CartQuote> {
    let quoted = lines
        .iter()
        .map(|&(product, quantity)| {
            Ok(QuotedLine {
                product_id: product.id,
                name: product.name.clone(),
                quantity,
                unit_price: to_display_f64(effective_price(product)?),
                line_total: to_display_f64(line_total(product, quantity)?),
                wholesale_eligible: is_wholesale_eligible(product, quantity),
                wholesale_price: product.wholesale_price,
            })
        })
        .collect::<PricingResult<Vec<_>>>()?;

    Ok(CartQuote {
        lines: quoted,
        total: to_display_f64(cart_total(lines.iter().copied())?),
        item_count: lines.iter().map(|&(_, quantity)| i64::from(quantity)).sum(),
    })
}
