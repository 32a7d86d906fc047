// ============================================================
// UPLOAD & MERGE USE CASE
// ============================================================
// Session workspace: two uploaded tables, a key selection, the last merge

use tracing::{info, warn};

use crate::application::use_cases::table_merge::TableMerger;
use crate::domain::error::{AppError, Result};
use crate::domain::table::{
    default_key, ExportedFile, JoinMode, JoinSelection, MergeRequest, MergeSummary, MergedTable,
    PreviewTarget, Table, TablePreview, TableSide,
};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::{CsvParser, CsvWriter, ParsedCsv};

pub struct UploadMergeUseCase {
    parser: CsvParser,
    writer: CsvWriter,
    merger: TableMerger,
    preview_rows: usize,
    output_file_name: String,

    left: Option<ParsedCsv>,
    right: Option<ParsedCsv>,
    selection: JoinSelection,
    merged: Option<MergedTable>,

    /// Delimiter of the left upload the last merge was built from
    merged_delimiter: Option<u8>,
}

impl Default for UploadMergeUseCase {
    fn default() -> Self {
        Self::new(
            CsvParser::default(),
            CsvWriter::default(),
            TableMerger::default(),
            5,
            "merged_output.csv",
        )
    }
}

impl UploadMergeUseCase {
    pub fn new(
        parser: CsvParser,
        writer: CsvWriter,
        merger: TableMerger,
        preview_rows: usize,
        output_file_name: impl Into<String>,
    ) -> Self {
        Self {
            parser,
            writer,
            merger,
            preview_rows,
            output_file_name: output_file_name.into(),
            left: None,
            right: None,
            selection: JoinSelection::default(),
            merged: None,
            merged_delimiter: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let parser = CsvParser::from_config(&config.csv)?;
        let writer = CsvWriter::new().with_delimiter(config.csv.delimiter_byte()?.unwrap_or(b','));
        let merger = TableMerger::new(config.merge.collision_suffix.clone());

        Ok(Self::new(
            parser,
            writer,
            merger,
            config.merge.preview_rows,
            config.merge.output_file_name.clone(),
        ))
    }

    pub fn default_preview_rows(&self) -> usize {
        self.preview_rows
    }

    pub fn parser(&self) -> &CsvParser {
        &self.parser
    }

    /// Decode and parse an upload without touching any workspace
    pub fn parse_upload(parser: &CsvParser, side: TableSide, bytes: &[u8]) -> Result<ParsedCsv> {
        parser.parse_bytes(bytes).map_err(|e| {
            warn!(side = %side, error = %e, "Rejected CSV upload");
            e
        })
    }

    /// Parse an upload into one side.
    ///
    /// On success the side's join key resets to the table's first column.
    /// On a parse error the workspace is left exactly as it was.
    pub fn load_table(&mut self, side: TableSide, bytes: &[u8]) -> Result<&Table> {
        let parsed = Self::parse_upload(&self.parser, side, bytes)?;
        Ok(self.install_table(side, parsed))
    }

    /// Replace one side with an already parsed upload
    pub fn install_table(&mut self, side: TableSide, parsed: ParsedCsv) -> &Table {
        info!(
            side = %side,
            columns = parsed.table.column_count(),
            rows = parsed.table.row_count(),
            delimiter = %(parsed.delimiter as char),
            "Loaded table"
        );

        self.selection.set_key(side, default_key(&parsed.table));
        let slot = match side {
            TableSide::Left => &mut self.left,
            TableSide::Right => &mut self.right,
        };
        &slot.insert(parsed).table
    }

    pub fn table(&self, side: TableSide) -> Option<&Table> {
        match side {
            TableSide::Left => self.left.as_ref().map(|p| &p.table),
            TableSide::Right => self.right.as_ref().map(|p| &p.table),
        }
    }

    pub fn merged(&self) -> Option<&MergedTable> {
        self.merged.as_ref()
    }

    pub fn selection(&self) -> &JoinSelection {
        &self.selection
    }

    pub fn select_key(&mut self, side: TableSide, key: impl Into<String>) {
        self.selection.set_key(side, key);
    }

    pub fn select_mode(&mut self, mode: JoinMode) {
        self.selection.join_type = mode;
    }

    /// Store the keys and mode a request carries without merging
    pub fn update_selection(&mut self, request: &MergeRequest) -> &JoinSelection {
        if let Some(key) = &request.left_key {
            self.select_key(TableSide::Left, key.clone());
        }
        if let Some(key) = &request.right_key {
            self.select_key(TableSide::Right, key.clone());
        }
        if let Some(mode) = request.join_type {
            self.select_mode(mode);
        }
        &self.selection
    }

    /// Merge the two loaded tables, applying any overrides in `request` to
    /// the stored selection first. Fails without merging when a side is
    /// missing.
    pub fn merge(&mut self, request: &MergeRequest) -> Result<MergeSummary> {
        let (Some(left), Some(right)) = (self.left.as_ref(), self.right.as_ref()) else {
            warn!(
                has_left = self.left.is_some(),
                has_right = self.right.is_some(),
                "Merge requested before both tables were uploaded"
            );
            return Err(AppError::PreconditionError(
                "Upload both CSV files before merging".to_string(),
            ));
        };

        let mut selection = self.selection.clone();
        selection.apply(request);

        let merged = self.merger.merge_with(&left.table, &right.table, &selection);
        let delimiter = left.delimiter;

        info!(
            join_type = %selection.join_type,
            left_key = %selection.left_key,
            right_key = %selection.right_key,
            rows = merged.row_count(),
            columns = merged.column_count(),
            "Merged tables"
        );

        let summary = MergeSummary {
            selection: selection.clone(),
            row_count: merged.row_count(),
            column_count: merged.column_count(),
            preview: merged.preview(self.preview_rows),
        };

        self.selection = selection;
        self.merged = Some(merged);
        self.merged_delimiter = Some(delimiter);
        Ok(summary)
    }

    /// Header plus up to `rows` rows (the configured default when `None`)
    pub fn preview(&self, target: PreviewTarget, rows: Option<usize>) -> Result<TablePreview> {
        let limit = rows.unwrap_or(self.preview_rows);
        let table = match target {
            PreviewTarget::Left => self.table(TableSide::Left),
            PreviewTarget::Right => self.table(TableSide::Right),
            PreviewTarget::Merged => self.merged.as_ref(),
        };

        table.map(|t| t.preview(limit)).ok_or_else(|| {
            AppError::NotFound(match target {
                PreviewTarget::Left => "No left table uploaded".to_string(),
                PreviewTarget::Right => "No right table uploaded".to_string(),
                PreviewTarget::Merged => "No merge has been run".to_string(),
            })
        })
    }

    /// Render the last merge for download, with the left upload's delimiter
    pub fn export(&self) -> Result<ExportedFile> {
        let merged = self
            .merged
            .as_ref()
            .ok_or_else(|| AppError::NotFound("No merge has been run".to_string()))?;

        let content = match self.merged_delimiter {
            Some(delimiter) => self.writer.clone().with_delimiter(delimiter).write_table(merged)?,
            None => self.writer.write_table(merged)?,
        };
        info!(
            file_name = %self.output_file_name,
            bytes = content.len(),
            "Exported merged table"
        );

        Ok(ExportedFile {
            file_name: self.output_file_name.clone(),
            content,
        })
    }

    /// Drop both uploads and the merge result
    pub fn reset(&mut self) {
        self.left = None;
        self.right = None;
        self.merged = None;
        self.merged_delimiter = None;
        self.selection = JoinSelection::default();
        info!("Workspace reset");
    }
}
