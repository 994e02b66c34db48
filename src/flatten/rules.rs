// src/flatten/rules.rs
//! The eight split functions. Each reads exactly one raw field and returns the
//! derived values the record actually carries; defaults for everything else
//! are seeded by the rule table in `flatten::enrich`.

use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};

use super::{Outputs, Record};

/// Copy `from` out of `src` under the derived name `to`, if present.
fn copy(out: &mut Outputs, src: &Map<String, Value>, from: &str, to: &'static str) {
    if let Some(value) = src.get(from) {
        out.push((to, value.clone()));
    }
}

/// Join the string-typed elements of `items` with newlines, skipping nested
/// formatting objects and other non-string elements.
fn join_strings(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Casting time: the source contract guarantees a non-empty `time` array, so a
/// missing, non-array, or empty one is a structural error. An empty first
/// element is tolerated and leaves the defaults.
pub fn split_time(spell: &Record) -> Result<Outputs> {
    let first = spell
        .get("time")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .ok_or_else(|| anyhow!("record has no casting time entry"))?;

    let mut out = Outputs::new();
    if let Some(entry) = first.as_object() {
        copy(&mut out, entry, "number", "time_number");
        copy(&mut out, entry, "unit", "time_unit");
        copy(&mut out, entry, "condition", "time_condition");
    }
    Ok(out)
}

/// Range: type plus the distance sub-object, with feet converted to meters
/// (x0.3, one decimal) and battle-map squares (/5, nearest integer, ties away
/// from zero).
pub fn split_range(spell: &Record) -> Result<Outputs> {
    let mut out = Outputs::new();
    let Some(range) = spell.get("range").and_then(Value::as_object) else {
        return Ok(out);
    };
    copy(&mut out, range, "type", "range_type");

    let Some(distance) = range.get("distance").and_then(Value::as_object) else {
        return Ok(out);
    };
    let is_self = distance.get("type").and_then(Value::as_str) == Some("self");
    out.push(("range_distance_self", Value::Bool(is_self)));

    if let Some(amount) = distance.get("amount") {
        out.push(("range_distance_feet", amount.clone()));
        if let Some(feet) = amount.as_f64() {
            let meters = (feet * 0.3 * 10.0).round() / 10.0;
            let squares = (feet / 5.0).round() as i64;
            out.push(("range_distance_meters", json!(meters)));
            out.push(("range_distance_squares", json!(squares)));
        }
    }
    Ok(out)
}

/// Components: presence flags for verbal/somatic/material, plus the material
/// payload. `m` is a tagged union: a bare string is just a description, an
/// object also carries cost and consume.
pub fn split_components(spell: &Record) -> Result<Outputs> {
    let mut out = Outputs::new();
    let Some(components) = spell.get("components").and_then(Value::as_object) else {
        return Ok(out);
    };
    out.push(("components_verbal", Value::Bool(components.contains_key("v"))));
    out.push(("components_somatic", Value::Bool(components.contains_key("s"))));

    let Some(material) = components.get("m") else {
        return Ok(out);
    };
    out.push(("components_material", Value::Bool(true)));
    match material {
        Value::String(description) => {
            out.push((
                "components_material_description",
                Value::String(description.clone()),
            ));
        }
        Value::Object(m) => {
            out.push((
                "components_material_description",
                m.get("text").cloned().unwrap_or(Value::Null),
            ));
            out.push((
                "components_material_gc_cost",
                m.get("cost").cloned().unwrap_or(Value::Null),
            ));
            out.push((
                "components_material_consume",
                m.get("consume").cloned().unwrap_or(Value::Bool(false)),
            ));
        }
        // e.g. `"m": true` — the flag above is all there is to record
        _ => {}
    }
    Ok(out)
}

/// Duration: unlike casting time, the source does not guarantee this array, so
/// a missing/empty/non-array `duration` quietly leaves the defaults.
pub fn split_duration(spell: &Record) -> Result<Outputs> {
    let mut out = Outputs::new();
    let Some(entry) = spell
        .get("duration")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(Value::as_object)
    else {
        return Ok(out);
    };

    copy(&mut out, entry, "type", "duration_type");
    copy(&mut out, entry, "concentration", "duration_concentration");
    copy(&mut out, entry, "ends", "duration_end_condition");

    if let Some(time) = entry.get("duration").and_then(Value::as_object) {
        copy(&mut out, time, "amount", "duration_time_number");
        copy(&mut out, time, "type", "duration_time_unit");
    }
    Ok(out)
}

/// Description entries: a list joins its string elements; anything else that
/// is present passes through unchanged.
pub fn split_entries(spell: &Record) -> Result<Outputs> {
    let mut out = Outputs::new();
    match spell.get("entries") {
        Some(Value::Array(items)) => {
            out.push(("entries_text", Value::String(join_strings(items))));
        }
        Some(Value::Null) | None => {}
        Some(other) => out.push(("entries_text", other.clone())),
    }
    Ok(out)
}

/// "At Higher Levels" text: replaced in place with the joined `entries` of the
/// list's first element, or null when that shape is absent. An already-flat
/// (non-list) value passes through unchanged.
pub fn split_entries_higher_level(spell: &Record) -> Result<Outputs> {
    let mut out = Outputs::new();
    match spell.get("entriesHigherLevel") {
        Some(Value::Array(items)) => {
            let text = items
                .first()
                .and_then(Value::as_object)
                .and_then(|first| first.get("entries"))
                .and_then(Value::as_array)
                .map(|entries| Value::String(join_strings(entries)))
                .unwrap_or(Value::Null);
            out.push(("entriesHigherLevel", text));
        }
        Some(Value::Null) | None => {}
        Some(other) => out.push(("entriesHigherLevel", other.clone())),
    }
    Ok(out)
}

/// Cantrip scaling: damage-type label plus the dice expression at each of the
/// four level thresholds.
pub fn split_scaling_level_dice(spell: &Record) -> Result<Outputs> {
    let mut out = Outputs::new();
    let Some(scaling) = spell.get("scalingLevelDice").and_then(Value::as_object) else {
        return Ok(out);
    };
    copy(&mut out, scaling, "label", "scalingLevelDice_dmg_type");

    if let Some(per_level) = scaling.get("scaling").and_then(Value::as_object) {
        copy(&mut out, per_level, "1", "scalingLevelDice_dice_lvl1");
        copy(&mut out, per_level, "5", "scalingLevelDice_dice_lvl5");
        copy(&mut out, per_level, "11", "scalingLevelDice_dice_lvl11");
        copy(&mut out, per_level, "17", "scalingLevelDice_dice_lvl17");
    }
    Ok(out)
}

/// Ritual tag: true only when `meta.ritual` is exactly boolean true.
pub fn split_meta_ritual(spell: &Record) -> Result<Outputs> {
    let mut out = Outputs::new();
    if let Some(ritual) = spell
        .get("meta")
        .and_then(Value::as_object)
        .and_then(|meta| meta.get("ritual"))
    {
        out.push(("ritual_cast", Value::Bool(ritual == &Value::Bool(true))));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::enrich;
    use serde_json::json;

    fn record(value: Value) -> Record {
        let mut spell = value.as_object().unwrap().clone();
        // every fixture needs a valid casting time to pass the time contract
        spell
            .entry("time")
            .or_insert_with(|| json!([{"number": 1, "unit": "action"}]));
        spell
    }

    #[test]
    fn time_splits_first_entry() {
        let mut spell = record(json!({
            "time": [{"number": 10, "unit": "minute", "condition": "which you take while observing"}]
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["time_number"], json!(10));
        assert_eq!(spell["time_unit"], json!("minute"));
        assert_eq!(
            spell["time_condition"],
            json!("which you take while observing")
        );
    }

    #[test]
    fn time_missing_is_a_structural_error() {
        let spell = json!({"name": "Broken"}).as_object().unwrap().clone();
        assert!(split_time(&spell).is_err());

        let empty = json!({"time": []}).as_object().unwrap().clone();
        assert!(split_time(&empty).is_err());
    }

    #[test]
    fn time_empty_object_leaves_defaults() {
        let mut spell = record(json!({"time": [{}]}));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["time_number"], json!(null));
        assert_eq!(spell["time_unit"], json!(null));
    }

    #[test]
    fn range_fireball_example() {
        let mut spell = record(json!({
            "name": "Fireball",
            "range": {"type": "point", "distance": {"type": "feet", "amount": 150}}
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["range_type"], json!("point"));
        assert_eq!(spell["range_distance_self"], json!(false));
        assert_eq!(spell["range_distance_feet"], json!(150));
        assert_eq!(spell["range_distance_meters"], json!(45.0));
        assert_eq!(spell["range_distance_squares"], json!(30));
    }

    #[test]
    fn range_meters_round_to_one_decimal() {
        let mut spell = record(json!({
            "range": {"type": "point", "distance": {"type": "feet", "amount": 25}}
        }));
        enrich(&mut spell).unwrap();
        // 25 * 0.3 = 7.5
        assert_eq!(spell["range_distance_meters"], json!(7.5));
        assert_eq!(spell["range_distance_squares"], json!(5));
    }

    #[test]
    fn range_self_flag() {
        let mut spell = record(json!({
            "range": {"type": "radius", "distance": {"type": "self"}}
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["range_distance_self"], json!(true));
        assert_eq!(spell["range_distance_feet"], json!(null));
        assert_eq!(spell["range_distance_meters"], json!(null));
        assert_eq!(spell["range_distance_squares"], json!(null));
    }

    #[test]
    fn components_material_string_variant() {
        let mut spell = record(json!({
            "components": {"v": true, "s": true, "m": "a tiny ball of bat guano and sulfur"}
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["components_verbal"], json!(true));
        assert_eq!(spell["components_somatic"], json!(true));
        assert_eq!(spell["components_material"], json!(true));
        assert_eq!(
            spell["components_material_description"],
            json!("a tiny ball of bat guano and sulfur")
        );
        assert_eq!(spell["components_material_gc_cost"], json!(null));
        assert_eq!(spell["components_material_consume"], json!(null));
    }

    #[test]
    fn components_material_object_variant() {
        let mut spell = record(json!({
            "components": {"v": true, "m": {"text": "a diamond worth 300 gp", "cost": 30000, "consume": true}}
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(
            spell["components_material_description"],
            json!("a diamond worth 300 gp")
        );
        assert_eq!(spell["components_material_gc_cost"], json!(30000));
        assert_eq!(spell["components_material_consume"], json!(true));
    }

    #[test]
    fn components_material_object_consume_defaults_false() {
        let mut spell = record(json!({
            "components": {"m": {"text": "ruby dust", "cost": 5000}}
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["components_material_consume"], json!(false));
        assert_eq!(spell["components_verbal"], json!(false));
        assert_eq!(spell["components_somatic"], json!(false));
    }

    #[test]
    fn duration_concentration_with_nested_time() {
        let mut spell = record(json!({
            "duration": [{
                "type": "timed",
                "concentration": true,
                "duration": {"type": "minute", "amount": 10}
            }]
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["duration_type"], json!("timed"));
        assert_eq!(spell["duration_concentration"], json!(true));
        assert_eq!(spell["duration_time_number"], json!(10));
        assert_eq!(spell["duration_time_unit"], json!("minute"));
        assert_eq!(spell["duration_end_condition"], json!(null));
    }

    #[test]
    fn duration_absent_or_empty_leaves_defaults() {
        for fixture in [json!({}), json!({"duration": []}), json!({"duration": "weird"})] {
            let mut spell = record(fixture);
            enrich(&mut spell).unwrap();
            assert_eq!(spell["duration_type"], json!(null));
            assert_eq!(spell["duration_concentration"], json!(false));
        }
    }

    #[test]
    fn duration_end_condition_copied() {
        let mut spell = record(json!({
            "duration": [{"type": "permanent", "ends": ["dispel", "trigger"]}]
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["duration_end_condition"], json!(["dispel", "trigger"]));
    }

    #[test]
    fn entries_join_skips_non_strings() {
        let mut spell = record(json!({
            "entries": ["First line.", {"type": "list", "items": ["x"]}, "Second line."]
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["entries_text"], json!("First line.\nSecond line."));
    }

    #[test]
    fn entries_non_list_passes_through() {
        let mut spell = record(json!({"entries": "Just one line."}));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["entries_text"], json!("Just one line."));
    }

    #[test]
    fn higher_level_entries_join() {
        let mut spell = record(json!({
            "entriesHigherLevel": [
                {"type": "entries", "name": "At Higher Levels", "entries": ["Line one.", "Line two."]}
            ]
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["entriesHigherLevel"], json!("Line one.\nLine two."));
    }

    #[test]
    fn higher_level_first_element_without_entries_is_null() {
        let mut spell = record(json!({
            "entriesHigherLevel": [{"type": "entries", "name": "At Higher Levels"}]
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["entriesHigherLevel"], json!(null));
    }

    #[test]
    fn scaling_level_dice_split() {
        let mut spell = record(json!({
            "scalingLevelDice": {
                "label": "fire damage",
                "scaling": {"1": "1d10", "5": "2d10", "11": "3d10", "17": "4d10"}
            }
        }));
        enrich(&mut spell).unwrap();
        assert_eq!(spell["scalingLevelDice_dmg_type"], json!("fire damage"));
        assert_eq!(spell["scalingLevelDice_dice_lvl1"], json!("1d10"));
        assert_eq!(spell["scalingLevelDice_dice_lvl5"], json!("2d10"));
        assert_eq!(spell["scalingLevelDice_dice_lvl11"], json!("3d10"));
        assert_eq!(spell["scalingLevelDice_dice_lvl17"], json!("4d10"));
    }

    #[test]
    fn ritual_flag_requires_exact_true() {
        let mut ritual = record(json!({"meta": {"ritual": true}}));
        enrich(&mut ritual).unwrap();
        assert_eq!(ritual["ritual_cast"], json!(true));

        let mut not_ritual = record(json!({"meta": {"ritual": "yes"}}));
        enrich(&mut not_ritual).unwrap();
        assert_eq!(not_ritual["ritual_cast"], json!(false));

        let mut no_meta = record(json!({}));
        enrich(&mut no_meta).unwrap();
        assert_eq!(no_meta["ritual_cast"], json!(false));
    }
}
