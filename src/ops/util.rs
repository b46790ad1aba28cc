//! Utility operators: Null, Cache, Output.

use crate::error::CookResult;
use crate::geometry::GeometryHandle;
use crate::param::{int_parameter, string_parameter, ParameterDefinition};
use crate::sop::{CookContext, Operator};

/// Pass-through. Useful as a named anchor point in a graph.
pub struct NullSop;

impl Operator for NullSop {
    fn type_name(&self) -> &'static str {
        "Null"
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        Ok(ctx.input(0))
    }
}

/// Freeze upstream geometry between cooks.
///
/// With caching enabled the operator retains a deep copy of its input.
/// While `lock_cache` is on, later cooks return the retained copy even
/// if upstream changed; the `clear_cache` button drops the copy so the
/// next cook captures fresh geometry.
#[derive(Default)]
pub struct CacheSop {
    retained: Option<GeometryHandle>,
}

impl Operator for CacheSop {
    fn type_name(&self) -> &'static str {
        "Cache"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("enable_cache", 0)
                .label("Enable Cache")
                .options(&["Off", "On"])
                .category("Cache")
                .build(),
            int_parameter("lock_cache", 0)
                .label("Lock Cache")
                .options(&["Off", "On"])
                .category("Cache")
                .description("Keep serving the retained copy even when upstream changes")
                .build(),
            int_parameter("clear_cache", 0)
                .label("Clear Cache")
                .hint("button")
                .category("Cache")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let enabled = ctx.get("enable_cache", 0) != 0;
        let locked = ctx.get("lock_cache", 0) != 0;
        let clear = ctx.get("clear_cache", 0) != 0;

        if clear {
            self.retained = None;
        }
        if !enabled {
            self.retained = None;
            return Ok(ctx.input(0));
        }
        if locked {
            if let Some(retained) = &self.retained {
                return Ok(retained.clone());
            }
        }
        let snapshot = ctx.input(0).deep_clone();
        self.retained = Some(snapshot.clone());
        Ok(snapshot)
    }
}

/// Named endpoint with display/render/export intent carried as metadata.
pub struct OutputSop;

impl Operator for OutputSop {
    fn type_name(&self) -> &'static str {
        "Output"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("output_name", "output1")
                .label("Output Name")
                .category("Output")
                .build(),
            int_parameter("render", 1)
                .label("Render")
                .options(&["Off", "On"])
                .category("Output")
                .build(),
            int_parameter("display", 1)
                .label("Display")
                .options(&["Off", "On"])
                .category("Output")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        Ok(ctx.input(0))
    }
}
