//! Field-to-column resolution.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{N_NCOLS_EXCEL_MAX, derive_default_num_format};
use crate::error::{GridMapError, Result};
use crate::spec::{EnumFieldKind, SpecFieldDescriptor, SpecResolvedField, SpecResolvedSchema};

/// Resolve descriptors into a column-ordered schema.
///
/// Explicit positions must be non-negative and unique. Fields at position `0` take the
/// smallest free positive column, in declaration order.
pub fn resolve_schema(descriptors: &[SpecFieldDescriptor]) -> Result<SpecResolvedSchema> {
    validate_descriptors(descriptors)?;

    let mut dict_explicit: BTreeMap<u32, &str> = BTreeMap::new();
    for desc in descriptors {
        let n_pos = derive_explicit_position(desc)?;
        if n_pos == 0 {
            continue;
        }
        if let Some(c_first) = dict_explicit.get(&n_pos) {
            return Err(GridMapError::DuplicateColumn {
                position: n_pos,
                field_first: (*c_first).to_string(),
                field_second: desc.name.clone(),
            });
        }
        dict_explicit.insert(n_pos, desc.name.as_str());
    }

    let mut set_used: BTreeSet<u32> = dict_explicit.keys().copied().collect();
    let mut n_cursor: u32 = 1;
    let mut l_fields = Vec::with_capacity(descriptors.len());

    for desc in descriptors {
        let mut n_pos = derive_explicit_position(desc)?;
        if n_pos == 0 {
            while set_used.contains(&n_cursor) {
                n_cursor += 1;
            }
            if n_cursor as usize > N_NCOLS_EXCEL_MAX {
                return Err(GridMapError::InvalidSchema(format!(
                    "no free column left for field {:?} within {N_NCOLS_EXCEL_MAX} columns",
                    desc.name
                )));
            }
            n_pos = n_cursor;
            set_used.insert(n_pos);
        }

        let config = desc.config.as_ref();
        l_fields.push(SpecResolvedField {
            name: desc.name.clone(),
            kind: desc.kind,
            col_position: n_pos,
            header_name: config
                .and_then(|cfg| cfg.header_name.clone())
                .unwrap_or_else(|| desc.name.clone()),
            data_format: config
                .and_then(|cfg| cfg.data_format.clone())
                .or_else(|| derive_default_num_format(desc.kind).map(ToString::to_string)),
        });
    }

    l_fields.sort_by_key(|field| field.col_position);
    log::debug!(
        "resolved schema: {}",
        l_fields
            .iter()
            .map(|field| format!("{}@{}", field.name, field.col_position))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(SpecResolvedSchema { fields: l_fields })
}

/// Resolve descriptors for read mode.
///
/// Every field must carry a configuration with a positive column.
pub fn resolve_read_schema(descriptors: &[SpecFieldDescriptor]) -> Result<SpecResolvedSchema> {
    for desc in descriptors {
        let if_configured = desc
            .config
            .as_ref()
            .is_some_and(|cfg| cfg.col_position != 0);
        if !if_configured {
            return Err(GridMapError::SchemaIncomplete {
                field: desc.name.clone(),
            });
        }
    }
    resolve_schema(descriptors)
}

fn validate_descriptors(descriptors: &[SpecFieldDescriptor]) -> Result<()> {
    if descriptors.is_empty() {
        return Err(GridMapError::MissingInput(
            "record type declares no fields".to_string(),
        ));
    }

    let mut set_names = BTreeSet::new();
    for desc in descriptors {
        if desc.name.trim().is_empty() {
            return Err(GridMapError::InvalidSchema(
                "field name cannot be blank".to_string(),
            ));
        }
        if !set_names.insert(desc.name.as_str()) {
            return Err(GridMapError::InvalidSchema(format!(
                "field {:?} is declared more than once",
                desc.name
            )));
        }
        if desc.kind == EnumFieldKind::Composite {
            return Err(GridMapError::UnsupportedType {
                field: desc.name.clone(),
                type_name: desc.kind.name().to_string(),
            });
        }
    }
    Ok(())
}

fn derive_explicit_position(desc: &SpecFieldDescriptor) -> Result<u32> {
    let n_pos = desc.config.as_ref().map_or(0, |cfg| cfg.col_position);
    if n_pos < 0 {
        return Err(GridMapError::InvalidSchema(format!(
            "column position of field {:?} must be >= 0, got {n_pos}",
            desc.name
        )));
    }
    if n_pos as usize > N_NCOLS_EXCEL_MAX {
        return Err(GridMapError::InvalidSchema(format!(
            "column position of field {:?} exceeds {N_NCOLS_EXCEL_MAX}",
            desc.name
        )));
    }
    // Bounded by the column limit above.
    Ok(n_pos as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> SpecFieldDescriptor {
        SpecFieldDescriptor::new(name, EnumFieldKind::Text)
    }

    #[test]
    fn test_auto_positions_fill_smallest_free_columns() {
        let schema = resolve_schema(&[
            field("b").at(2),
            field("auto_1"),
            field("d").at(4),
            field("auto_2"),
        ])
        .expect("resolve");

        assert_eq!(schema.names(), vec!["auto_1", "b", "auto_2", "d"]);
        assert_eq!(
            schema
                .fields
                .iter()
                .map(|f| f.col_position)
                .collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_auto_positions_skip_past_explicit_block() {
        let schema = resolve_schema(&[
            field("x").at(1),
            field("y").at(2),
            field("z"),
            field("w").at(10),
        ])
        .expect("resolve");
        let z = schema.fields.iter().find(|f| f.name == "z").expect("z");
        assert_eq!(z.col_position, 3);
        assert_eq!(schema.fields.last().map(|f| f.col_position), Some(10));
    }

    #[test]
    fn test_duplicate_explicit_column_is_rejected() {
        let err = resolve_schema(&[field("a").at(3), field("b").at(3)]).expect_err("dup");
        match err {
            GridMapError::DuplicateColumn {
                position,
                field_first,
                field_second,
            } => {
                assert_eq!(position, 3);
                assert_eq!(field_first, "a");
                assert_eq!(field_second, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_column_is_invalid_schema() {
        assert!(matches!(
            resolve_schema(&[field("a").at(-1)]),
            Err(GridMapError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_defaults_for_header_and_format() {
        let schema = resolve_schema(&[
            SpecFieldDescriptor::new("salary", EnumFieldKind::Float),
            SpecFieldDescriptor::new("count", EnumFieldKind::Integer).header("Count"),
            SpecFieldDescriptor::new("born", EnumFieldKind::DateTime).format("yyyy-mm-dd"),
        ])
        .expect("resolve");

        assert_eq!(schema.fields[0].header_name, "salary");
        assert_eq!(schema.fields[0].data_format.as_deref(), Some("0.00"));
        assert_eq!(schema.fields[1].header_name, "Count");
        assert_eq!(schema.fields[1].data_format, None);
        assert_eq!(schema.fields[2].data_format.as_deref(), Some("yyyy-mm-dd"));
    }

    #[test]
    fn test_composite_kind_is_unsupported() {
        let err = resolve_schema(&[
            field("a"),
            SpecFieldDescriptor::new("nested", EnumFieldKind::Composite),
        ])
        .expect_err("composite");
        assert!(matches!(err, GridMapError::UnsupportedType { ref field, .. } if field == "nested"));
    }

    #[test]
    fn test_read_schema_requires_explicit_columns() {
        let err = resolve_read_schema(&[field("a").at(1), field("b")]).expect_err("incomplete");
        assert!(matches!(err, GridMapError::SchemaIncomplete { ref field } if field == "b"));

        let err = resolve_read_schema(&[field("a").at(1), field("b").header("B")])
            .expect_err("header only");
        assert!(matches!(err, GridMapError::SchemaIncomplete { .. }));

        assert!(resolve_read_schema(&[field("a").at(2), field("b").at(1)]).is_ok());
    }

    #[test]
    fn test_empty_descriptor_list_is_missing_input() {
        assert!(matches!(
            resolve_schema(&[]),
            Err(GridMapError::MissingInput(_))
        ));
    }
}
