//! Render context — catalog vars plus an injected `steward` meta block.

use serde::{Deserialize, Serialize};

use steward_core::types::VarMap;

use crate::error::RenderError;

/// Meta block available to every template as `{{ steward.version }}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub version: String,
}

impl Default for MetaCtx {
    fn default() -> Self {
        MetaCtx {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Build a [`tera::Context`] from catalog vars.
///
/// Each var lands at the template's top level under its own key; the
/// `steward` meta block is inserted last so a stray `steward` var cannot
/// shadow it.
pub fn build_context(vars: &VarMap) -> Result<tera::Context, RenderError> {
    let mut ctx = tera::Context::new();
    for (key, value) in vars {
        ctx.insert(key.as_str(), value);
    }
    ctx.insert("steward", &MetaCtx::default());
    Ok(ctx)
}
