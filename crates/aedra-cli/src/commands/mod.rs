//! CLI command implementations

pub mod completions;
pub mod config;
pub mod edge;
pub mod graph;
pub mod node;
pub mod script;
pub mod traverse;

use aedra_core::{Coordinates, GraphStore, Payload};

use crate::output::OutputFormat;
use crate::AppContext;

/// Parse a payload argument: JSON if it parses, a plain string otherwise
pub fn parse_payload(raw: &str) -> Payload {
    serde_json::from_str(raw).unwrap_or_else(|_| Payload::String(raw.to_string()))
}

/// Parse `x,y` or `x,y,z`
pub fn parse_coordinates(raw: &str) -> Result<Coordinates, String> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in '{}': {}", raw, e))?;
    match parts.as_slice() {
        [x, y] => Ok(Coordinates::new(*x, *y, 0.0)),
        [x, y, z] => Ok(Coordinates::new(*x, *y, *z)),
        _ => Err(format!("expected x,y or x,y,z but got '{}'", raw)),
    }
}

/// Print a human-readable note; suppressed for JSON output and `--quiet`
pub fn note(ctx: &AppContext, message: impl AsRef<str>) {
    if !ctx.quiet && ctx.format == OutputFormat::Table {
        println!("{}", message.as_ref());
    }
}

/// Run one mutation against the current graph.
///
/// The graph is saved and then its events printed, only when the operation
/// succeeds.
/// An ignored operation (such as a duplicate edge) is reported and yields
/// `None`; any other error is returned.
pub async fn mutate<T>(
    ctx: &AppContext,
    op: impl FnOnce(&mut GraphStore) -> aedra_core::Result<T>,
) -> anyhow::Result<Option<T>> {
    let (mut store, events) = ctx.open_graph().await?;
    match op(&mut store) {
        Ok(value) => {
            ctx.save_graph(&store).await?;
            ctx.print_events(&events.drain())?;
            Ok(Some(value))
        }
        Err(e) if e.is_ignored() => {
            tracing::warn!("Ignored: {}", e);
            note(ctx, format!("Ignored: {}", e));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload("42"), json!(42));
        assert_eq!(parse_payload("{\"k\": [1]}"), json!({"k": [1]}));
        assert_eq!(parse_payload("Root"), json!("Root"));
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(parse_coordinates("1,2").unwrap(), Coordinates::new(1.0, 2.0, 0.0));
        assert_eq!(
            parse_coordinates("1.5, -2, 3").unwrap(),
            Coordinates::new(1.5, -2.0, 3.0)
        );
        assert!(parse_coordinates("1").is_err());
        assert!(parse_coordinates("a,b").is_err());
    }
}
