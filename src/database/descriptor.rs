//! Static field-descriptor tables and the metadata extractor.
//!
//! Every resource declares its persisted shape once as an [`EntityDef`]: which
//! fields are columns, which are join-producing embedded sub-entities, which
//! are write-once or searchable, which are computed aggregates.
//! [`EntityDescriptor::extract`] walks that declaration and merges the nested
//! definitions into the flat column/join/output lists the query builder and
//! row materializer consume. Descriptors are rebuilt per request; extraction
//! is infallible.

/// A declared LEFT JOIN target and its ON-condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub table: String,
    pub alias: String,
    pub on: String,
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub output: Option<String>,
    pub searchable: bool,
    pub write_once: bool,
}

/// Start a column definition. The output field defaults to the column name.
pub fn col(name: &str) -> ColumnDef {
    ColumnDef {
        name: name.to_string(),
        output: Some(name.to_string()),
        searchable: false,
        write_once: false,
    }
}

impl ColumnDef {
    pub fn output(mut self, field: &str) -> Self {
        self.output = Some(field.to_string());
        self
    }

    /// Participates in the free-text OR-search.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Settable at creation only; silently excluded from update maps.
    pub fn write_once(mut self) -> Self {
        self.write_once = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddedDef {
    pub alias: String,
    pub join: Option<(String, String)>,
    pub entity: EntityDef,
    pub persisted: bool,
}

/// Embed a sub-entity under `alias`. Its columns are selected alongside the
/// parent's and regrouped into a nested object on the way out.
pub fn embed(alias: &str, entity: EntityDef) -> EmbeddedDef {
    EmbeddedDef {
        alias: alias.to_string(),
        join: None,
        entity,
        persisted: false,
    }
}

impl EmbeddedDef {
    pub fn join(mut self, table: &str, on: &str) -> Self {
        self.join = Some((table.to_string(), on.to_string()));
        self
    }

    /// The sub-entity's row is written alongside the owner (insert, update
    /// keyed by `(parent_id, field)`, cascade delete).
    pub fn persisted(mut self) -> Self {
        self.persisted = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum FieldDef {
    Column(ColumnDef),
    Aggregate { expr: String, output: String },
    Embedded(EmbeddedDef),
    Join(JoinSpec),
}

/// A resource's persisted shape: root table plus an ordered field list.
#[derive(Debug, Clone)]
pub struct EntityDef {
    pub table: String,
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    pub fn new(table: &str) -> Self {
        Self { table: table.to_string(), fields: vec![] }
    }

    pub fn column(mut self, def: ColumnDef) -> Self {
        self.fields.push(FieldDef::Column(def));
        self
    }

    /// Raw aggregate expression selected under `output`'s alias.
    pub fn aggregate(mut self, expr: &str, output: &str) -> Self {
        self.fields.push(FieldDef::Aggregate { expr: expr.to_string(), output: output.to_string() });
        self
    }

    pub fn embedded(mut self, def: EmbeddedDef) -> Self {
        self.fields.push(FieldDef::Embedded(def));
        self
    }

    pub fn join(mut self, table: &str, alias: &str, on: &str) -> Self {
        self.fields.push(FieldDef::Join(JoinSpec {
            table: table.to_string(),
            alias: alias.to_string(),
            on: on.to_string(),
        }));
        self
    }

    /// Root-level column definitions, in declaration order.
    pub fn root_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.fields.iter().filter_map(|f| match f {
            FieldDef::Column(c) => Some(c),
            _ => None,
        })
    }

    /// Embedded sub-entities whose rows are persisted with the owner.
    pub fn persisted_embeds(&self) -> impl Iterator<Item = &EmbeddedDef> {
        self.fields.iter().filter_map(|f| match f {
            FieldDef::Embedded(e) if e.persisted => Some(e),
            _ => None,
        })
    }

    /// Whether `name` is a root-table column. Request-supplied filter and
    /// sort keys must pass this check before reaching SQL text.
    pub fn has_root_column(&self, name: &str) -> bool {
        self.root_columns().any(|c| c.name == name)
    }
}

/// Flattened metadata for one entity: everything the query builder and the
/// row materializer need, merged across embedded sub-entities.
#[derive(Debug, Clone, Default)]
pub struct EntityDescriptor {
    pub table: String,
    /// Full SELECT expressions; columns with an output field are aliased to
    /// their dotted path so rows decode by name.
    pub select_exprs: Vec<String>,
    pub group_by: Vec<String>,
    /// Dotted output paths, one per aliased select expression, in SELECT order.
    pub output_fields: Vec<String>,
    pub filter_columns: Vec<String>,
    pub joins: Vec<JoinSpec>,
    pub has_aggregation: bool,
}

impl EntityDescriptor {
    pub fn extract(def: &EntityDef) -> Self {
        let mut descriptor = Self { table: def.table.clone(), ..Self::default() };
        descriptor.walk("", &def.table, def);
        if !descriptor.has_aggregation {
            descriptor.group_by.clear();
        }
        descriptor
    }

    fn walk(&mut self, alias: &str, table: &str, def: &EntityDef) {
        for field in &def.fields {
            match field {
                FieldDef::Embedded(e) => {
                    if let Some((join_table, on)) = &e.join {
                        self.joins.push(JoinSpec {
                            table: join_table.clone(),
                            alias: e.alias.clone(),
                            on: on.clone(),
                        });
                    }
                    let child_table = e.join.as_ref().map(|(t, _)| t.as_str()).unwrap_or(table);
                    self.walk(&e.alias, child_table, &e.entity);
                }
                FieldDef::Column(c) => {
                    // Column identifiers are quoted: `translation` carries a
                    // column literally named "table".
                    let qualified = if alias.is_empty() {
                        format!("{}.\"{}\"", table, c.name)
                    } else {
                        format!("{}.\"{}\"", alias, c.name)
                    };
                    self.group_by.push(qualified.clone());
                    if c.searchable {
                        self.filter_columns.push(qualified.clone());
                    }
                    match &c.output {
                        Some(output) => {
                            let path = qualify_output(alias, output);
                            self.select_exprs.push(format!("{} AS \"{}\"", qualified, path));
                            self.output_fields.push(path);
                        }
                        None => self.select_exprs.push(qualified),
                    }
                }
                FieldDef::Aggregate { expr, output } => {
                    let path = qualify_output(alias, output);
                    self.select_exprs.push(format!("{} AS \"{}\"", expr, path));
                    self.output_fields.push(path);
                    self.has_aggregation = true;
                }
                FieldDef::Join(j) => self.joins.push(j.clone()),
            }
        }
    }

    /// Root identifier column, qualified. Used for id lookups and the
    /// default sort order.
    pub fn id_column(&self) -> String {
        format!("{}.\"id\"", self.table)
    }
}

fn qualify_output(alias: &str, output: &str) -> String {
    if alias.is_empty() {
        output.to_string()
    } else {
        format!("{}.{}", alias, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated_text() -> EntityDef {
        EntityDef::new("translation")
            .column(col("id").write_once())
            .column(col("parent_id").write_once())
            .column(col("en").searchable())
            .column(col("pt").searchable())
    }

    fn sample() -> EntityDef {
        EntityDef::new("place")
            .column(col("id").write_once())
            .column(col("active"))
            .embedded(
                embed("title", translated_text())
                    .join("translation", "title.parent_id = place.id and title.field = 'title'")
                    .persisted(),
            )
    }

    #[test]
    fn merges_embedded_columns_and_outputs() {
        let descriptor = EntityDescriptor::extract(&sample());
        assert_eq!(
            descriptor.output_fields,
            vec!["id", "active", "title.id", "title.parent_id", "title.en", "title.pt"]
        );
        assert_eq!(descriptor.select_exprs[0], "place.\"id\" AS \"id\"");
        assert_eq!(descriptor.select_exprs[4], "title.\"en\" AS \"title.en\"");
    }

    #[test]
    fn registers_join_for_embedded_entity() {
        let descriptor = EntityDescriptor::extract(&sample());
        assert_eq!(descriptor.joins.len(), 1);
        assert_eq!(descriptor.joins[0].alias, "title");
        assert_eq!(descriptor.joins[0].table, "translation");
    }

    #[test]
    fn collects_searchable_columns_with_alias() {
        let descriptor = EntityDescriptor::extract(&sample());
        assert_eq!(descriptor.filter_columns, vec!["title.\"en\"", "title.\"pt\""]);
    }

    #[test]
    fn group_by_cleared_without_aggregation() {
        let descriptor = EntityDescriptor::extract(&sample());
        assert!(!descriptor.has_aggregation);
        assert!(descriptor.group_by.is_empty());
    }

    #[test]
    fn aggregate_keeps_group_by_and_flags() {
        let def = EntityDef::new("trip")
            .column(col("id"))
            .aggregate("count(p.id)", "participants")
            .join("trip_participant", "p", "p.trip_id = trip.id");
        let descriptor = EntityDescriptor::extract(&def);
        assert!(descriptor.has_aggregation);
        assert_eq!(descriptor.group_by, vec!["trip.\"id\""]);
        assert_eq!(descriptor.select_exprs[1], "count(p.id) AS \"participants\"");
        assert_eq!(descriptor.joins[0].alias, "p");
    }

    #[test]
    fn root_column_lookup() {
        let def = sample();
        assert!(def.has_root_column("active"));
        assert!(!def.has_root_column("en"));
    }
}
