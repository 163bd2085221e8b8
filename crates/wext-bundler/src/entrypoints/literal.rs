//! Static evaluation of JavaScript literals.
//!
//! Entrypoint options must be readable without running the entrypoint, so
//! only literal expressions (objects, arrays, strings, numbers, booleans,
//! `null`, template strings without substitutions) are evaluated. The same
//! evaluator parses the JSON5 content of HTML meta tags, since JSON5 is a
//! subset of JavaScript expression syntax.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, Expression, ObjectExpression, ObjectPropertyKind, Statement, UnaryOperator,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde_json::{Map, Number, Value};

/// Functions whose first argument declares an entrypoint's options.
const DEFINE_FUNCTIONS: &[&str] = &[
    "defineBackground",
    "defineContentScript",
    "defineUnlistedScript",
];

/// Parse `text` as JSON5.
///
/// ```
/// use wext_bundler::entrypoints::literal::parse_json5;
///
/// let value = parse_json5("{ matches: ['*://*/*'], allFrames: true, }").unwrap();
/// assert_eq!(value["allFrames"], serde_json::json!(true));
/// ```
pub fn parse_json5(text: &str) -> Result<Value, String> {
    let allocator = Allocator::default();
    let expression = Parser::new(&allocator, text, SourceType::mjs())
        .parse_expression()
        .map_err(|errors| {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        })?;
    evaluate(&expression).ok_or_else(|| format!("`{text}` is not a literal value"))
}

/// Read the options object declared by a script entrypoint.
///
/// Looks at the default export: either `defineXxx({ ... })` or a bare object.
/// A default export without options (for example `defineBackground(() => {})`)
/// yields an empty object.
pub fn script_options(source: &str, path: &Path) -> Result<Map<String, Value>, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; "));
    }

    for statement in &ret.program.body {
        if let Statement::ExportDefaultDeclaration(export) = statement {
            return match export.declaration.as_expression() {
                Some(expression) => definition_options(expression),
                None => Ok(Map::new()),
            };
        }
    }

    Ok(Map::new())
}

fn definition_options(expression: &Expression<'_>) -> Result<Map<String, Value>, String> {
    match unwrap_expression(expression) {
        Expression::ObjectExpression(object) => options_object(object),
        Expression::CallExpression(call) => {
            if let Expression::Identifier(ident) = &call.callee {
                if !DEFINE_FUNCTIONS.contains(&ident.name.as_str()) {
                    return Ok(Map::new());
                }
            }
            match call.arguments.first().and_then(Argument::as_expression) {
                Some(argument) => match unwrap_expression(argument) {
                    Expression::ObjectExpression(object) => options_object(object),
                    _ => Ok(Map::new()),
                },
                None => Ok(Map::new()),
            }
        }
        _ => Ok(Map::new()),
    }
}

/// Top-level options object: functions (the entrypoint's logic) are skipped,
/// every other property must be a literal.
fn options_object(object: &ObjectExpression<'_>) -> Result<Map<String, Value>, String> {
    let mut options = Map::new();
    for property in &object.properties {
        let ObjectPropertyKind::ObjectProperty(property) = property else {
            return Err("spread properties are not supported in entrypoint options".to_string());
        };
        if property.method || is_function(&property.value) {
            continue;
        }
        let key = property
            .key
            .static_name()
            .ok_or_else(|| "computed keys are not supported in entrypoint options".to_string())?;
        let value = evaluate(&property.value)
            .ok_or_else(|| format!("`{key}` must be a static literal value"))?;
        options.insert(key.to_string(), value);
    }
    Ok(options)
}

fn evaluate(expression: &Expression<'_>) -> Option<Value> {
    match expression {
        Expression::NullLiteral(_) => Some(Value::Null),
        Expression::BooleanLiteral(lit) => Some(Value::Bool(lit.value)),
        Expression::StringLiteral(lit) => Some(Value::String(lit.value.to_string())),
        Expression::NumericLiteral(lit) => number(lit.value),
        Expression::TemplateLiteral(lit) if lit.expressions.is_empty() => {
            lit.quasis.first().map(|quasi| {
                let text = quasi.value.cooked.as_ref().unwrap_or(&quasi.value.raw);
                Value::String(text.to_string())
            })
        }
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::UnaryNegation => {
            match &unary.argument {
                Expression::NumericLiteral(lit) => number(-lit.value),
                _ => None,
            }
        }
        Expression::ArrayExpression(array) => array
            .elements
            .iter()
            .map(|element| element.as_expression().and_then(evaluate))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        Expression::ObjectExpression(object) => {
            let mut map = Map::new();
            for property in &object.properties {
                let ObjectPropertyKind::ObjectProperty(property) = property else {
                    return None;
                };
                if property.computed {
                    return None;
                }
                let key = property.key.static_name()?;
                map.insert(key.to_string(), evaluate(&property.value)?);
            }
            Some(Value::Object(map))
        }
        Expression::ParenthesizedExpression(_)
        | Expression::TSAsExpression(_)
        | Expression::TSSatisfiesExpression(_) => evaluate(unwrap_expression(expression)),
        _ => None,
    }
}

/// Strip parentheses and `as` / `satisfies` type assertions.
fn unwrap_expression<'a, 'b>(expression: &'b Expression<'a>) -> &'b Expression<'a> {
    match expression {
        Expression::ParenthesizedExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSAsExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSSatisfiesExpression(inner) => unwrap_expression(&inner.expression),
        other => other,
    }
}

fn is_function(expression: &Expression<'_>) -> bool {
    matches!(
        unwrap_expression(expression),
        Expression::FunctionExpression(_) | Expression::ArrowFunctionExpression(_)
    )
}

fn number(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(Value::Number(Number::from(value as i64)))
    } else {
        Number::from_f64(value).map(Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json5_accepts_single_quotes_and_trailing_commas() {
        assert_eq!(parse_json5("['a', \"b\",]").unwrap(), json!(["a", "b"]));
        assert_eq!(
            parse_json5("{ chrome: false, firefox: true }").unwrap(),
            json!({ "chrome": false, "firefox": true })
        );
        assert_eq!(parse_json5("-2").unwrap(), json!(-2));
    }

    #[test]
    fn json5_rejects_identifiers() {
        assert!(parse_json5("someVariable").is_err());
    }

    #[test]
    fn reads_define_content_script_options() {
        let source = r#"
import { mount } from "./ui";

export default defineContentScript({
  matches: ["*://*.example.com/*"],
  runAt: "document_start",
  world: "MAIN" as const,
  main(ctx) {
    mount(ctx);
  },
});
"#;
        let options = script_options(source, Path::new("overlay.content.ts")).unwrap();
        assert_eq!(options["matches"], json!(["*://*.example.com/*"]));
        assert_eq!(options["runAt"], json!("document_start"));
        assert_eq!(options["world"], json!("MAIN"));
        assert!(!options.contains_key("main"));
    }

    #[test]
    fn function_only_definition_has_no_options() {
        let source = "export default defineBackground(() => { console.log('hi'); });";
        let options = script_options(source, Path::new("background.ts")).unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn arrow_main_property_is_skipped() {
        let source = "export default defineBackground({ type: 'module', main: () => {} });";
        let options = script_options(source, Path::new("background.js")).unwrap();
        assert_eq!(options, Map::from_iter([("type".to_string(), json!("module"))]));
    }

    #[test]
    fn non_literal_option_is_an_error() {
        let source = "const m = ['<all_urls>'];\nexport default defineContentScript({ matches: m, main() {} });";
        let err = script_options(source, Path::new("a.content.js")).unwrap_err();
        assert!(err.contains("matches"));
    }

    #[test]
    fn missing_default_export_has_no_options() {
        let options = script_options("console.log(1);", Path::new("injected.js")).unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(script_options("export default {", Path::new("broken.js")).is_err());
    }
}
