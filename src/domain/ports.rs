use crate::domain::table::{Quoting, Table};
use crate::utils::error::Result;

/// Whole-file access to the CSV tables and report files of one directory.
pub trait TableStore {
    fn exists(&self, name: &str) -> bool;
    fn read_text(&self, name: &str) -> Result<String>;
    fn write_text(&self, name: &str, content: &str) -> Result<()>;

    fn read_table(&self, name: &str) -> Result<Table> {
        let text = self.read_text(name)?;
        Table::from_reader(name, text.as_bytes())
    }

    /// Read a table, or start an empty one with `headers` when the file does not exist yet.
    fn read_table_or_empty(&self, name: &str, headers: &[&str]) -> Result<Table> {
        if self.exists(name) {
            self.read_table(name)
        } else {
            Ok(Table::new(
                name,
                headers.iter().map(|h| h.to_string()).collect(),
            ))
        }
    }

    fn write_table(&self, table: &Table, quoting: Quoting) -> Result<()> {
        let content = table.to_csv_string(quoting)?;
        self.write_text(table.name(), &content)
    }
}

/// The monument image folders, one per yard.
pub trait ImageLibrary {
    fn folder_exists(&self, folder: &str) -> bool;
    /// File names directly inside `folder`, sorted.
    fn list(&self, folder: &str) -> Result<Vec<String>>;
    fn contains(&self, folder: &str, file: &str) -> bool;
    fn rename(&self, folder: &str, from: &str, to: &str) -> Result<()>;
}

/// What a job would change, plus the text shown to the operator.
pub trait ChangeSet {
    fn change_count(&self) -> usize;
    fn render(&self) -> String;

    fn is_empty(&self) -> bool {
        self.change_count() == 0
    }
}

/// A single-purpose maintenance command: look at the records, then optionally write.
pub trait Job {
    type Plan: ChangeSet;

    fn name(&self) -> &'static str;
    fn plan(&self) -> Result<Self::Plan>;
    fn apply(&self, plan: &Self::Plan) -> Result<()>;
}
