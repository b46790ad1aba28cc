//! File import and export operators.

use crate::error::{CookError, CookResult};
use crate::geometry::GeometryHandle;
use crate::io::obj;
use crate::param::{int_parameter, string_parameter, ParameterDefinition};
use crate::sop::{CookContext, InputConfig, Operator};

/// Read an OBJ file into a fresh container.
pub struct FileSop;

impl Operator for FileSop {
    fn type_name(&self) -> &'static str {
        "File"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("file_path", "")
                .label("File Path")
                .hint("filepath")
                .category("File")
                .build(),
            int_parameter("reload", 0)
                .label("Reload")
                .hint("button")
                .category("File")
                .description("Force a re-read of the file on the next cook")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let file_path: String = ctx.get("file_path", String::new());
        if file_path.is_empty() {
            return Err(CookError::parameter_invalid("file path is empty"));
        }
        let resolved = ctx.host().resolve_path(&file_path);
        let geo = obj::import_obj(&resolved).map_err(|e| {
            CookError::resource_failure(format!("failed to read '{file_path}': {e}"))
        })?;
        Ok(geo.into())
    }
}

/// Write the input to disk as OBJ and pass it through unchanged.
pub struct ExportSop;

impl Operator for ExportSop {
    fn type_name(&self) -> &'static str {
        "Export"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("file_path", "")
                .label("File Path")
                .hint("filepath_save")
                .category("Export")
                .build(),
            int_parameter("export_now", 0)
                .label("Export Now")
                .hint("button")
                .category("Export")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let file_path: String = ctx.get("file_path", String::new());
        let input = ctx.input_writable(0)?;
        if !file_path.is_empty() {
            let resolved = ctx.host().resolve_path(&file_path);
            let geo = input.read().expect("non-empty");
            obj::export_obj(geo, &resolved).map_err(|e| {
                CookError::resource_failure(format!("failed to write '{file_path}': {e}"))
            })?;
        }
        Ok(input)
    }
}
