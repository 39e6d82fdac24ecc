//! One-shot delivery resolution, as checkout would request it.

use pizzeria_core::Coordinate;
use pizzeria_storefront::delivery::ResolveInput;
use pizzeria_storefront::state::AppState;

/// Resolve `address` and/or `coordinate` (latitude, longitude) and print the
/// decision as JSON.
///
/// # Errors
///
/// Returns an error if neither input is given, the database cannot be
/// reached, or the geocoding client cannot be built.
pub async fn run(
    address: Option<String>,
    coordinate: Option<(f64, f64)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = super::connect().await?;
    let state = AppState::new(config, pool)?;

    let input = ResolveInput {
        address_text: address,
        coordinate: coordinate.map(|(lat, lon)| Coordinate::new(lat, lon)),
    };
    let decision = state.resolver().resolve(input).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    }
    Ok(())
}
