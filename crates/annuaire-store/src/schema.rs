//! SQL generated from the static record schemas
//!
//! Column lists come from `RecordKind::fields()` only. Nothing here ever
//! reads a key out of a request payload.

use annuaire_domain::{FieldType, RecordKind, ID_FIELD};

fn column_type(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Text | FieldType::Date | FieldType::Time => "TEXT",
        FieldType::Integer | FieldType::Bool => "INTEGER",
        FieldType::Float => "REAL",
    }
}

fn column_list(kind: RecordKind) -> String {
    kind.fields()
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CREATE TABLE IF NOT EXISTS` for one kind, plus its lookup index
pub fn create_table(kind: RecordKind) -> String {
    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", ID_FIELD)];
    for field in kind.fields() {
        let mut column = format!("{} {}", field.name, column_type(field.ty));
        if field.required {
            column.push_str(" NOT NULL");
        }
        columns.push(column);
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    {columns}\n);\n\
         CREATE INDEX IF NOT EXISTS idx_{table}_{primary} ON {table}({primary});\n",
        table = kind.table(),
        columns = columns.join(",\n    "),
        primary = kind.primary_field(),
    )
}

/// Schema for every kind
pub fn create_all() -> String {
    RecordKind::ALL.iter().map(|k| create_table(*k)).collect()
}

/// `SELECT numero, <fields...> FROM <table>` without a filter
pub fn select(kind: RecordKind) -> String {
    format!("SELECT {}, {} FROM {}", ID_FIELD, column_list(kind), kind.table())
}

/// All rows, oldest first
pub fn select_all(kind: RecordKind) -> String {
    format!("{} ORDER BY {}", select(kind), ID_FIELD)
}

/// One row by id
pub fn select_by_id(kind: RecordKind) -> String {
    format!("{} WHERE {} = ?1", select(kind), ID_FIELD)
}

/// Close-match lookup
///
/// `?1` primary value, `?2` threshold, `?3` secondary value. An empty
/// secondary value never matches on its initial.
pub fn select_similar(kind: RecordKind) -> String {
    format!(
        "{select} WHERE similarity({primary}, ?1) > ?2 \
         OR (length(?3) > 0 AND substr({secondary}, 1, 1) = substr(?3, 1, 1)) \
         ORDER BY {id}",
        select = select(kind),
        primary = kind.primary_field(),
        secondary = kind.secondary_field(),
        id = ID_FIELD,
    )
}

/// Insert of every schema field; the id is assigned by SQLite
pub fn insert(kind: RecordKind) -> String {
    let placeholders = (1..=kind.fields().len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        kind.table(),
        column_list(kind),
        placeholders
    )
}

/// Full-row update; the id is the last parameter
pub fn update(kind: RecordKind) -> String {
    let fields = kind.fields();
    let assignments = fields
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = ?{}", f.name, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        kind.table(),
        assignments,
        ID_FIELD,
        fields.len() + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_marks_required_columns() {
        let ddl = create_table(RecordKind::DirectoryEntry);
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS annuaire"));
        assert!(ddl.contains("numero INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(ddl.contains("nom TEXT NOT NULL"));
        assert!(ddl.contains("npa INTEGER,"));
        assert!(ddl.contains("coord_geo_lat REAL"));
        assert!(!ddl.contains("courriel TEXT NOT NULL"));
    }

    #[test]
    fn test_update_places_id_last() {
        let sql = update(RecordKind::EventEntry);
        let n = RecordKind::EventEntry.fields().len();
        assert!(sql.starts_with("UPDATE evenement SET nom_evenement = ?1"));
        assert!(sql.ends_with(&format!("WHERE numero = ?{}", n + 1)));
    }

    #[test]
    fn test_insert_has_one_placeholder_per_field() {
        let sql = insert(RecordKind::DirectoryEntry);
        let n = RecordKind::DirectoryEntry.fields().len();
        assert!(sql.contains(&format!("?{})", n)));
        assert!(!sql.contains(ID_FIELD));
    }

    #[test]
    fn test_similar_uses_kind_fields() {
        let sql = select_similar(RecordKind::DirectoryEntry);
        assert!(sql.contains("similarity(nom, ?1) > ?2"));
        assert!(sql.contains("substr(prenom, 1, 1)"));
        let sql = select_similar(RecordKind::EventEntry);
        assert!(sql.contains("similarity(nom_evenement, ?1)"));
        assert!(sql.contains("substr(nom_evenement, 1, 1)"));
    }
}
