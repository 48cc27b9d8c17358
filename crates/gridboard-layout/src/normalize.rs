//! Normalization of persisted layout formats
//!
//! Two formats exist in storage: the current flat list of entries, and a
//! legacy per-breakpoint map (`{"lg": [...], "md": [...]}`). Everything is
//! normalized to a flat list against one reference breakpoint before any
//! other processing. Corrupt entries are dropped and reported, never fatal:
//! the reconciler regenerates a layout for any component left without one.

use gridboard_core::LayoutEntry;
use serde_json::Value;

/// Fallback breakpoint order when the configured reference is absent
const BREAKPOINT_PREFERENCE: [&str; 4] = ["lg", "md", "sm", "xs"];

/// Result of normalizing one persisted layout blob
#[derive(Debug, Default)]
pub struct NormalizedLayouts {
    /// Entries that parsed cleanly, clamped to the grid
    pub entries: Vec<LayoutEntry>,
    /// Human-readable descriptions of everything that was dropped
    pub issues: Vec<String>,
    /// Whether the blob was in the legacy per-breakpoint shape
    pub was_legacy: bool,
}

impl NormalizedLayouts {
    /// Check whether the persisted form can be kept as-is
    ///
    /// A legacy-shaped blob is never clean even when every entry parses:
    /// it must be re-persisted flat so future loads are stable.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && !self.was_legacy
    }
}

/// Normalize a persisted layout value to a flat entry list
///
/// `reference_breakpoint` selects the row of a legacy per-breakpoint map;
/// when absent, the widest known breakpoint present is used instead.
/// Entries that fail to parse, or with zero width/height, are dropped and
/// recorded as issues.
#[must_use]
pub fn normalize_layouts(raw: &Value, reference_breakpoint: &str, columns: u32) -> NormalizedLayouts {
    match raw {
        Value::Array(items) => parse_entries(items, columns),
        Value::Object(map) => {
            let chosen = select_breakpoint(map, reference_breakpoint);
            let mut normalized = match chosen {
                Some((name, Value::Array(items))) => {
                    let mut normalized = parse_entries(items, columns);
                    if name != reference_breakpoint {
                        normalized.issues.push(format!(
                            "reference breakpoint '{reference_breakpoint}' absent, used '{name}'"
                        ));
                    }
                    normalized
                }
                Some((name, _)) => NormalizedLayouts {
                    issues: vec![format!("breakpoint '{name}' is not a layout list")],
                    ..NormalizedLayouts::default()
                },
                None => NormalizedLayouts {
                    issues: vec!["per-breakpoint map contains no layouts".to_string()],
                    ..NormalizedLayouts::default()
                },
            };
            normalized.was_legacy = true;
            normalized
        }
        Value::Null => NormalizedLayouts::default(),
        other => NormalizedLayouts {
            issues: vec![format!("unsupported persisted layout shape: {other}")],
            ..NormalizedLayouts::default()
        },
    }
}

fn select_breakpoint<'a>(
    map: &'a serde_json::Map<String, Value>,
    reference: &str,
) -> Option<(&'a str, &'a Value)> {
    if let Some((key, value)) = map.get_key_value(reference) {
        return Some((key.as_str(), value));
    }
    for name in BREAKPOINT_PREFERENCE {
        if let Some((key, value)) = map.get_key_value(name) {
            return Some((key.as_str(), value));
        }
    }
    map.iter().next().map(|(k, v)| (k.as_str(), v))
}

fn parse_entries(items: &[Value], columns: u32) -> NormalizedLayouts {
    let mut normalized = NormalizedLayouts::default();
    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value::<LayoutEntry>(item.clone()) {
            Ok(entry) if entry.w == 0 || entry.h == 0 => {
                normalized
                    .issues
                    .push(format!("entry {i} has a degenerate rectangle, dropped"));
            }
            Ok(mut entry) => {
                if clamp_to_grid(&mut entry, columns) {
                    normalized
                        .issues
                        .push(format!("entry {i} exceeded the grid, clamped"));
                }
                normalized.entries.push(entry);
            }
            Err(e) => {
                normalized.issues.push(format!("entry {i} unparsable: {e}"));
            }
        }
    }
    normalized
}

fn clamp_to_grid(entry: &mut LayoutEntry, columns: u32) -> bool {
    let mut clamped = false;
    if entry.w > columns {
        entry.w = columns;
        clamped = true;
    }
    if entry.x + entry.w > columns {
        entry.x = columns - entry.w;
        clamped = true;
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::ComponentIndex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry_json(id: ComponentIndex, x: u32, y: u32, w: u32, h: u32) -> Value {
        json!({"component_id": id, "x": x, "y": y, "w": w, "h": h, "locked": false})
    }

    #[test]
    fn flat_list_passes_through() {
        let id = ComponentIndex::fresh();
        let raw = json!([entry_json(id, 0, 0, 4, 4)]);
        let normalized = normalize_layouts(&raw, "lg", 12);

        assert!(normalized.is_clean());
        assert_eq!(normalized.entries.len(), 1);
        assert_eq!(normalized.entries[0].component_id, id);
    }

    #[test]
    fn legacy_map_uses_reference_breakpoint() {
        let id_lg = ComponentIndex::fresh();
        let id_md = ComponentIndex::fresh();
        let raw = json!({
            "lg": [entry_json(id_lg, 0, 0, 6, 4)],
            "md": [entry_json(id_md, 0, 0, 4, 4)],
        });
        let normalized = normalize_layouts(&raw, "lg", 12);

        assert!(normalized.issues.is_empty());
        assert!(normalized.was_legacy);
        assert!(!normalized.is_clean());
        assert_eq!(normalized.entries.len(), 1);
        assert_eq!(normalized.entries[0].component_id, id_lg);
    }

    #[test]
    fn legacy_map_falls_back_when_reference_absent() {
        let id = ComponentIndex::fresh();
        let raw = json!({"md": [entry_json(id, 0, 0, 4, 4)]});
        let normalized = normalize_layouts(&raw, "lg", 12);

        assert_eq!(normalized.entries.len(), 1);
        assert_eq!(normalized.issues.len(), 1);
        assert!(normalized.issues[0].contains("used 'md'"));
    }

    #[test]
    fn corrupt_entries_are_dropped_not_fatal() {
        let id = ComponentIndex::fresh();
        let raw = json!([
            entry_json(id, 0, 0, 4, 4),
            {"component_id": "not-a-uuid", "x": 0},
            42,
        ]);
        let normalized = normalize_layouts(&raw, "lg", 12);

        assert_eq!(normalized.entries.len(), 1);
        assert_eq!(normalized.issues.len(), 2);
    }

    #[test]
    fn degenerate_rectangles_are_dropped() {
        let raw = json!([entry_json(ComponentIndex::fresh(), 0, 0, 0, 4)]);
        let normalized = normalize_layouts(&raw, "lg", 12);

        assert!(normalized.entries.is_empty());
        assert_eq!(normalized.issues.len(), 1);
    }

    #[test]
    fn wide_entries_are_clamped() {
        let raw = json!([entry_json(ComponentIndex::fresh(), 10, 0, 6, 2)]);
        let normalized = normalize_layouts(&raw, "lg", 12);

        let entry = &normalized.entries[0];
        assert_eq!(entry.w, 6);
        assert_eq!(entry.x, 6);
    }

    #[test]
    fn null_is_an_empty_layout() {
        let normalized = normalize_layouts(&Value::Null, "lg", 12);
        assert!(normalized.entries.is_empty());
        assert!(normalized.is_clean());
    }

    #[test]
    fn scalar_blob_is_reported() {
        let normalized = normalize_layouts(&json!("garbage"), "lg", 12);
        assert!(normalized.entries.is_empty());
        assert_eq!(normalized.issues.len(), 1);
    }
}
