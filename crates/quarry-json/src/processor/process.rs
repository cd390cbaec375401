use indexmap::IndexMap;
use log::warn;
use quarry_common::spec::Literal;

use crate::error::JsonResult;
use crate::node::JsonNode;
use crate::options::{
    ArrayOptions, FieldMatching, JsonKind, JsonOptions, ObjectKvOptions, ObjectOptions,
    RepeatedFieldBehavior, TupleOptions, TypedObjectOptions, ValueOptions, EXACT_MATCH,
};
use crate::processor::context::Context;
use crate::processor::scalar::{
    parse_big_decimal, parse_big_integer, parse_bool, parse_char, parse_f32, parse_f64,
    parse_instant, parse_instant_number, parse_integral, parse_string, Leaf,
};

type Entries = [(String, JsonNode)];

/// Finds the value of a field, applying the repeated field behavior.
/// The behavior of the field matching takes precedence over `behavior`.
fn lookup<'a>(
    entries: &'a Entries,
    name: &str,
    matching: &FieldMatching,
    behavior: RepeatedFieldBehavior,
    ctx: &Context,
) -> JsonResult<Option<&'a JsonNode>> {
    let behavior = matching.repeated_behavior.unwrap_or(behavior);
    let mut values = entries
        .iter()
        .filter(|(k, _)| matching.matches(name, k))
        .map(|(_, v)| v);
    let first = values.next();
    if first.is_some()
        && behavior == RepeatedFieldBehavior::Error
        && values.next().is_some()
    {
        return Err(ctx.error(format!("field '{name}' is repeated")));
    }
    Ok(first)
}

fn push_nulls(count: usize, out: &mut Vec<Literal>) {
    out.extend((0..count).map(|_| Literal::Null));
}

/// Collects per-element rows into one array cell per column.
fn push_array_cells(
    element: &ValueOptions,
    rows: Vec<Vec<Literal>>,
    out: &mut Vec<Literal>,
) {
    let columns = element.output_columns();
    let mut cells = columns
        .iter()
        .map(|_| Vec::with_capacity(rows.len()))
        .collect::<Vec<_>>();
    for row in rows {
        for (cell, value) in cells.iter_mut().zip(row) {
            cell.push(value);
        }
    }
    for (column, elements) in columns.into_iter().zip(cells) {
        out.push(Literal::Array {
            element_type: column.data_type,
            elements,
        });
    }
}

impl ValueOptions {
    /// Checks that the value is allowed by this option.
    /// `None` denotes a missing value.
    pub(crate) fn check(&self, value: Option<&JsonNode>, ctx: &Context) -> JsonResult<()> {
        match value {
            None if !self.allow_missing() => Err(ctx.error(format!(
                "missing value is not allowed for {}",
                self.kind_name()
            ))),
            Some(node) if !self.accepts(node.kind()) => Err(ctx.error(format!(
                "unexpected {} value for {}",
                node.kind(),
                self.kind_name()
            ))),
            _ => Ok(()),
        }
    }

    /// Appends the values of the output columns of this option for one JSON value.
    /// `None` denotes a missing value.
    pub(crate) fn process(
        &self,
        value: Option<&JsonNode>,
        ctx: &Context,
        out: &mut Vec<Literal>,
    ) -> JsonResult<()> {
        let literal = match self {
            ValueOptions::Bool(x) => Leaf::new("bool", x).process(value, ctx, parse_bool)?,
            ValueOptions::Char(x) => Leaf::new("char", x).process(value, ctx, parse_char)?,
            ValueOptions::Byte(x) => {
                let allow_decimal = x.desired_types.contains(JsonKind::Decimal);
                Leaf::new("byte", x).process(value, ctx, |n| {
                    parse_integral::<i8>(n, "byte", allow_decimal)
                })?
            }
            ValueOptions::Short(x) => {
                let allow_decimal = x.desired_types.contains(JsonKind::Decimal);
                Leaf::new("short", x).process(value, ctx, |n| {
                    parse_integral::<i16>(n, "short", allow_decimal)
                })?
            }
            ValueOptions::Int(x) => {
                let allow_decimal = x.desired_types.contains(JsonKind::Decimal);
                Leaf::new("int", x).process(value, ctx, |n| {
                    parse_integral::<i32>(n, "int", allow_decimal)
                })?
            }
            ValueOptions::Long(x) => {
                let allow_decimal = x.desired_types.contains(JsonKind::Decimal);
                Leaf::new("long", x).process(value, ctx, |n| {
                    parse_integral::<i64>(n, "long", allow_decimal)
                })?
            }
            ValueOptions::Float(x) => Leaf::new("float", x).process(value, ctx, parse_f32)?,
            ValueOptions::Double(x) => Leaf::new("double", x).process(value, ctx, parse_f64)?,
            ValueOptions::String(x) => {
                Leaf::new("string", x).process(value, ctx, parse_string)?
            }
            ValueOptions::Instant(x) => {
                Leaf::new("instant", x).process(value, ctx, parse_instant)?
            }
            ValueOptions::InstantNumber(x) => {
                let allow_decimal = x.desired_types.contains(JsonKind::Decimal);
                Leaf::from(x).process(value, ctx, |n| {
                    parse_instant_number(n, x.format, allow_decimal)
                })?
            }
            ValueOptions::BigInteger(x) => {
                let allow_decimal = x.desired_types.contains(JsonKind::Decimal);
                Leaf::new("big_integer", x).process(value, ctx, |n| {
                    parse_big_integer(n, allow_decimal)
                })?
            }
            ValueOptions::BigDecimal(x) => {
                Leaf::new("big_decimal", x).process(value, ctx, parse_big_decimal)?
            }
            ValueOptions::Any => match value {
                None | Some(JsonNode::Null) => Literal::Null,
                Some(node) => Literal::Json(node.to_value()),
            },
            ValueOptions::Skip(_) => return self.check(value, ctx),
            ValueOptions::Object(x) => {
                self.check(value, ctx)?;
                return process_object(x, value, ctx, out);
            }
            ValueOptions::Array(x) => {
                self.check(value, ctx)?;
                return process_array(x, value, ctx, out);
            }
            ValueOptions::ObjectKv(x) => {
                self.check(value, ctx)?;
                return process_object_kv(x, value, ctx, out);
            }
            ValueOptions::Tuple(x) => {
                self.check(value, ctx)?;
                return process_tuple(x, value, ctx, out);
            }
            ValueOptions::TypedObject(x) => {
                self.check(value, ctx)?;
                return process_typed_object(x, value, ctx, out);
            }
        };
        out.push(literal);
        Ok(())
    }
}

fn process_fields(
    fields: &IndexMap<String, JsonOptions>,
    matching: &IndexMap<String, FieldMatching>,
    entries: &Entries,
    behavior: RepeatedFieldBehavior,
    ctx: &Context,
    out: &mut Vec<Literal>,
) -> JsonResult<()> {
    for (name, child) in fields {
        let field_matching = matching.get(name).unwrap_or(&EXACT_MATCH);
        let value = lookup(entries, name, field_matching, behavior, ctx)?;
        child
            .value_options()
            .process(value, &ctx.field(name), out)?;
    }
    Ok(())
}

fn process_object(
    options: &ObjectOptions,
    value: Option<&JsonNode>,
    ctx: &Context,
    out: &mut Vec<Literal>,
) -> JsonResult<()> {
    match value {
        Some(JsonNode::Object(entries)) => {
            if !options.allow_unknown_fields {
                if let Some((name, _)) = entries.iter().find(|(k, _)| !options.knows(k)) {
                    return Err(ctx.error(format!("unexpected field '{name}'")));
                }
            }
            process_fields(
                &options.fields,
                &options.field_matching,
                entries,
                options.repeated_field_behavior,
                ctx,
                out,
            )
        }
        // A null object is a null value for every field,
        // and a missing object is a missing value for every field.
        other => {
            for (name, child) in &options.fields {
                child
                    .value_options()
                    .process(other, &ctx.field(name), out)?;
            }
            Ok(())
        }
    }
}

fn process_array(
    options: &ArrayOptions,
    value: Option<&JsonNode>,
    ctx: &Context,
    out: &mut Vec<Literal>,
) -> JsonResult<()> {
    let element = options.element.value_options();
    match value {
        Some(JsonNode::Array(items)) => {
            let rows = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let mut row = vec![];
                    element.process(Some(item), &ctx.index(i), &mut row)?;
                    Ok(row)
                })
                .collect::<JsonResult<Vec<_>>>()?;
            push_array_cells(element, rows, out);
            Ok(())
        }
        _ => {
            push_nulls(element.output_count(), out);
            Ok(())
        }
    }
}

fn process_object_kv(
    options: &ObjectKvOptions,
    value: Option<&JsonNode>,
    ctx: &Context,
    out: &mut Vec<Literal>,
) -> JsonResult<()> {
    let key = options.key.value_options();
    let value_options = options.value.value_options();
    match value {
        Some(JsonNode::Object(entries)) => {
            let mut keys = Vec::with_capacity(entries.len());
            let mut values = Vec::with_capacity(entries.len());
            for (name, item) in entries.iter() {
                let ctx = ctx.field(name);
                let mut row = vec![];
                key.process(Some(&JsonNode::String(name.clone())), &ctx, &mut row)?;
                keys.push(row);
                let mut row = vec![];
                value_options.process(Some(item), &ctx, &mut row)?;
                values.push(row);
            }
            push_array_cells(key, keys, out);
            push_array_cells(value_options, values, out);
            Ok(())
        }
        _ => {
            push_nulls(key.output_count() + value_options.output_count(), out);
            Ok(())
        }
    }
}

fn process_tuple(
    options: &TupleOptions,
    value: Option<&JsonNode>,
    ctx: &Context,
    out: &mut Vec<Literal>,
) -> JsonResult<()> {
    match value {
        Some(JsonNode::Array(items)) => {
            if items.len() != options.values.len() {
                return Err(ctx.error(format!(
                    "expected a tuple of {} elements, found {}",
                    options.values.len(),
                    items.len()
                )));
            }
            for (i, (slot, item)) in options.values.iter().zip(items).enumerate() {
                slot.value_options()
                    .process(Some(item), &ctx.index(i), out)?;
            }
            Ok(())
        }
        // A null tuple is a tuple of nulls, and a missing tuple is a tuple of missing values.
        other => {
            for (i, slot) in options.values.iter().enumerate() {
                slot.value_options().process(other, &ctx.index(i), out)?;
            }
            Ok(())
        }
    }
}

fn process_typed_object(
    options: &TypedObjectOptions,
    value: Option<&JsonNode>,
    ctx: &Context,
    out: &mut Vec<Literal>,
) -> JsonResult<()> {
    let object_counts = options
        .objects
        .values()
        .map(|x| {
            x.fields
                .values()
                .map(|f| f.value_options().output_count())
                .sum::<usize>()
        })
        .collect::<Vec<_>>();
    let shared_count = options
        .shared_fields
        .values()
        .map(|x| x.value_options().output_count())
        .sum::<usize>();
    let all_nulls = 1 + shared_count + object_counts.iter().sum::<usize>();

    let Some(JsonNode::Object(entries)) = value else {
        push_nulls(all_nulls, out);
        return Ok(());
    };
    let type_ctx = ctx.field(&options.type_field);
    let behavior = options.repeated_field_behavior;
    let tag = match lookup(entries, &options.type_field, &EXACT_MATCH, behavior, ctx)? {
        Some(JsonNode::String(x)) => x,
        Some(JsonNode::Null) if options.desired_types.allows_null() => {
            push_nulls(all_nulls, out);
            return Ok(());
        }
        Some(other) => {
            return Err(type_ctx.error(format!(
                "expected a string type value, found {}",
                other.kind()
            )))
        }
        None => {
            return Err(ctx.error(format!(
                "missing type field '{}'",
                options.type_field
            )))
        }
    };
    let selected = options.objects.get(tag);
    let allow_unknown_fields = match selected {
        Some(object) => object.allow_unknown_fields,
        None if options.allow_unknown_types => {
            warn!("unknown type '{tag}' at {type_ctx}");
            true
        }
        None => return Err(type_ctx.error(format!("unknown type '{tag}'"))),
    };
    if !allow_unknown_fields {
        let unknown = entries.iter().find(|(k, _)| {
            *k != options.type_field
                && !options.shared_fields.contains_key(k)
                && !selected.is_some_and(|x| x.knows(k))
        });
        if let Some((name, _)) = unknown {
            return Err(ctx.error(format!("unexpected field '{name}' for type '{tag}'")));
        }
    }

    out.push(Literal::String(tag.clone()));
    process_fields(
        &options.shared_fields,
        &IndexMap::new(),
        entries,
        behavior,
        ctx,
        out,
    )?;
    for ((name, object), count) in options.objects.iter().zip(object_counts) {
        if name == tag {
            process_fields(
                &object.fields,
                &object.field_matching,
                entries,
                object.repeated_field_behavior,
                ctx,
                out,
            )?;
        } else {
            push_nulls(count, out);
        }
    }
    Ok(())
}
