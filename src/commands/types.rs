use serde_json::{json, Map, Value};

use crate::{
    catalog::TypeQuery,
    commands::{
        request::{parse_body, SearchTypesRequest},
        variables::serialize,
        CommandResult, CommandService, FailureCode,
    },
    host::World,
};

impl CommandService {
    /// Query the type catalog. Every filter is optional; `max_results` defaults to the
    /// configured page size.
    pub(super) fn search_types(&self, request: &Value) -> CommandResult {
        let request: SearchTypesRequest = parse_body(request)?;

        let mut query = TypeQuery::new()
            .with_include_user_types(request.include_blueprints.unwrap_or(true))
            .with_include_native_types(request.include_engine_types.unwrap_or(true))
            .with_include_abstract(request.include_abstract.unwrap_or(true))
            .with_include_deprecated(request.include_deprecated.unwrap_or(true))
            .with_page(
                request.page_offset.unwrap_or(0),
                request.max_results.unwrap_or(self.config.default_page_size),
            );
        if let Some(category) = request.category {
            query = query.with_category(category);
        }
        if let Some(search_text) = request.search_text {
            query = query.with_search_text(search_text);
        }
        if let Some(parent_path) = request.parent_path {
            query = query.with_parent(parent_path);
        }

        let page = self.catalog.query_page(&query);
        let mut data = Map::new();
        data.insert("total_count".to_string(), Value::from(page.total_count));
        data.insert("generation".to_string(), Value::from(page.generation));
        data.insert(
            "types".to_string(),
            serialize(FailureCode::InvalidRequest, &page.types)?,
        );
        Ok(Value::Object(data))
    }

    pub(super) fn diagnostics(&self, world: &World) -> CommandResult {
        let owners: Vec<Value> = world
            .owners()
            .map(|owner| {
                json!({
                    "name": owner.name,
                    "path": owner.path(),
                    "generated_class": owner.generated_class_path(),
                    "variable_count": owner.variables().len(),
                })
            })
            .collect();

        Ok(json!({
            "catalog": serialize(FailureCode::InvalidRequest, &self.catalog.stats())?,
            "resolver": serialize(FailureCode::InvalidRequest, &self.resolver.cache_stats())?,
            "owners": owners,
        }))
    }
}
