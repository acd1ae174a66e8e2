mod expr;
mod set_expr;
mod statement;
mod table;

use sqlparser::ast::{Ident, ObjectName, ObjectNamePart};

pub use statement::lower_statement;

use super::tree::{Name, NameParts};

pub(crate) fn lower_ident(ident: &Ident) -> Name {
    Name {
        value:  ident.value.as_str().into(),
        quoted: ident.quote_style.is_some()
    }
}

/// Lower an object name, or describe the part that is not a plain identifier
pub(crate) fn lower_object_name(name: &ObjectName) -> Result<NameParts, String> {
    name.0
        .iter()
        .map(|part| match part {
            ObjectNamePart::Identifier(ident) => Ok(lower_ident(ident)),
            #[allow(unreachable_patterns)]
            other => Err(format!("computed object name `{}`", other))
        })
        .collect()
}

/// Shorten SQL text used in unsupported-construct descriptions
pub(crate) fn describe(kind: &str, sql: impl std::fmt::Display) -> String {
    const MAX: usize = 60;
    let text = sql.to_string();
    if text.chars().count() > MAX {
        let short: String = text.chars().take(MAX).collect();
        format!("{kind} `{short}...`")
    } else {
        format!("{kind} `{text}`")
    }
}
