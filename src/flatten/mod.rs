// src/flatten/mod.rs
//! Record flattening: per-field normalization rules that turn each nested or
//! variant spell sub-structure into a fixed set of scalar output fields.

use anyhow::{Context, Result};
use serde_json::Value;

mod rules;

/// One spell entry, before or after flattening. Key order is insertion order
/// (`serde_json` is built with `preserve_order`), which drives the first-seen
/// column order downstream.
pub type Record = serde_json::Map<String, Value>;

/// Output of one rule's split: the derived fields it actually found in the
/// record. Keys the split does not emit fall back to the rule's declared seed.
pub type Outputs = Vec<(&'static str, Value)>;

/// Default value seeded for a declared output key before the split's findings
/// are overlaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    Null,
    False,
}

impl Seed {
    pub fn to_value(self) -> Value {
        match self {
            Seed::Null => Value::Null,
            Seed::False => Value::Bool(false),
        }
    }
}

/// One flattening rule: the raw field it reads, the full set of output keys it
/// guarantees to populate, and the split function that extracts whatever the
/// record actually carries.
pub struct Rule {
    /// Raw input key this rule reads. Used for error context only.
    pub field: &'static str,
    /// Every output key with its default seed. A rule always populates all of
    /// these, never a subset.
    pub outputs: &'static [(&'static str, Seed)],
    /// Reads the raw field and returns the derived values present. Must not
    /// emit keys outside `outputs`.
    pub split: fn(&Record) -> Result<Outputs>,
}

/// The full ordered rule set. Order is fixed but immaterial: no rule reads
/// another rule's output.
pub static RULES: &[Rule] = &[
    Rule {
        field: "time",
        outputs: &[
            ("time_number", Seed::Null),
            ("time_unit", Seed::Null),
            ("time_condition", Seed::Null),
        ],
        split: rules::split_time,
    },
    Rule {
        field: "range",
        outputs: &[
            ("range_type", Seed::Null),
            ("range_distance_self", Seed::False),
            ("range_distance_feet", Seed::Null),
            ("range_distance_meters", Seed::Null),
            ("range_distance_squares", Seed::Null),
        ],
        split: rules::split_range,
    },
    Rule {
        field: "components",
        outputs: &[
            ("components_verbal", Seed::False),
            ("components_somatic", Seed::False),
            ("components_material", Seed::False),
            ("components_material_description", Seed::Null),
            ("components_material_gc_cost", Seed::Null),
            ("components_material_consume", Seed::Null),
        ],
        split: rules::split_components,
    },
    Rule {
        field: "duration",
        outputs: &[
            ("duration_type", Seed::Null),
            ("duration_concentration", Seed::False),
            ("duration_time_number", Seed::Null),
            ("duration_time_unit", Seed::Null),
            ("duration_end_condition", Seed::Null),
        ],
        split: rules::split_duration,
    },
    Rule {
        field: "entries",
        outputs: &[("entries_text", Seed::Null)],
        split: rules::split_entries,
    },
    Rule {
        field: "entriesHigherLevel",
        outputs: &[("entriesHigherLevel", Seed::Null)],
        split: rules::split_entries_higher_level,
    },
    Rule {
        field: "scalingLevelDice",
        outputs: &[
            ("scalingLevelDice_dmg_type", Seed::Null),
            ("scalingLevelDice_dice_lvl1", Seed::Null),
            ("scalingLevelDice_dice_lvl5", Seed::Null),
            ("scalingLevelDice_dice_lvl11", Seed::Null),
            ("scalingLevelDice_dice_lvl17", Seed::Null),
        ],
        split: rules::split_scaling_level_dice,
    },
    Rule {
        field: "meta",
        outputs: &[("ritual_cast", Seed::False)],
        split: rules::split_meta_ritual,
    },
];

/// Apply every rule to one record, in place. Each rule's split reads the raw
/// field before any of that rule's outputs are written, so a rule whose output
/// key shadows its input key (entriesHigherLevel) still sees the raw value.
/// After this returns, the record carries the full declared derived key set.
pub fn enrich(spell: &mut Record) -> Result<()> {
    for rule in RULES {
        let found = (rule.split)(spell)
            .with_context(|| format!("splitting `{}` field", rule.field))?;

        for (key, seed) in rule.outputs {
            spell.insert((*key).to_string(), seed.to_value());
        }
        for (key, value) in found {
            debug_assert!(
                rule.outputs.iter().any(|(declared, _)| *declared == key),
                "rule `{}` emitted undeclared key `{}`",
                rule.field,
                key
            );
            spell.insert(key.to_string(), value);
        }
    }
    Ok(())
}
