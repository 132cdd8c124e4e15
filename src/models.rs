use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    pub missing: usize,
    pub missing_share: f64,
    pub unique: usize,
    pub is_numeric: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub missing_count: usize,
    pub missing_share: f64,
}

/// Per-column null accounting, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingTable {
    pub entries: Vec<MissingEntry>,
}

impl MissingTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&MissingEntry> {
        self.entries.iter().find(|e| e.column == column)
    }

    pub fn max_share(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.missing_share)
            .fold(0.0, f64::max)
    }
}

/// Square Pearson matrix over the numeric columns. `None` marks a pair whose
/// coefficient is undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTable {
    pub column: String,
    pub entries: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopCategories {
    pub tables: Vec<CategoryTable>,
}

impl TopCategories {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&CategoryTable> {
        self.tables.iter().find(|t| t.column == column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityFlags {
    pub quality_score: f64,
    pub max_missing_share: f64,
    pub too_few_rows: bool,
    pub too_many_columns: bool,
    pub too_many_missing: bool,
    pub has_constant_columns: bool,
    pub has_high_cardinality_categoricals: bool,
    pub has_numeric_columns_with_low_variation: bool,
}

impl QualityFlags {
    pub fn triggered(&self) -> usize {
        [
            self.too_few_rows,
            self.too_many_columns,
            self.too_many_missing,
            self.has_constant_columns,
            self.has_high_cardinality_categoricals,
            self.has_numeric_columns_with_low_variation,
        ]
        .iter()
        .filter(|flag| **flag)
        .count()
    }
}

/// The six boolean heuristics without the score, as written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagSet {
    pub too_few_rows: bool,
    pub too_many_columns: bool,
    pub too_many_missing: bool,
    pub has_constant_columns: bool,
    pub has_high_cardinality_categoricals: bool,
    pub has_numeric_columns_with_low_variation: bool,
}

impl From<&QualityFlags> for FlagSet {
    fn from(flags: &QualityFlags) -> Self {
        Self {
            too_few_rows: flags.too_few_rows,
            too_many_columns: flags.too_many_columns,
            too_many_missing: flags.too_many_missing,
            has_constant_columns: flags.has_constant_columns,
            has_high_cardinality_categoricals: flags.has_high_cardinality_categoricals,
            has_numeric_columns_with_low_variation: flags.has_numeric_columns_with_low_variation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSummary {
    pub n_rows: usize,
    pub n_cols: usize,
    pub quality_score: f64,
    pub problematic_columns: Vec<String>,
    pub flags: FlagSet,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}
