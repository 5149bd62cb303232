use super::types::GridType;

/// Calculates the grid level prices for the configured band.
///
/// * `grid_type` - Arithmetic or Geometric spacing.
/// * `lower_price` - The bottom of the grid range (level 0).
/// * `upper_price` - The top of the grid range (level `grid_count - 1`).
/// * `grid_count` - The number of levels to generate.
///
/// Returns a `Vec<f64>` of ascending prices, one per level.
pub fn calculate_grid_prices(
    grid_type: GridType,
    lower_price: f64,
    upper_price: f64,
    grid_count: u32,
) -> Vec<f64> {
    let mut prices = Vec::with_capacity(grid_count as usize);

    match grid_type {
        GridType::Arithmetic => {
            let step = (upper_price - lower_price) / (grid_count as f64 - 1.0);
            for i in 0..grid_count {
                prices.push(lower_price + (i as f64 * step));
            }
        }
        GridType::Geometric => {
            let ratio = (upper_price / lower_price).powf(1.0 / (grid_count as f64 - 1.0));
            for i in 0..grid_count {
                prices.push(lower_price * ratio.powi(i as i32));
            }
        }
    }
    prices
}
