use crate::error::AppError;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use polars::prelude::*;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

/// Cells holding one of these markers load as null, matching the markers
/// pandas treats as missing by default.
pub const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const LOSSY_SUFFIX: &str = "-lossy";

/// Source text encoding, resolved from a WHATWG label such as `utf-8`,
/// `latin-1` or `cp1251`. A `-lossy` suffix swaps malformed sequences for
/// U+FFFD instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding {
    encoding: &'static Encoding,
    lossy: bool,
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            lossy: false,
        }
    }
}

impl TextEncoding {
    pub fn parse(label: &str) -> Result<Self, AppError> {
        let normalized = label.trim().to_ascii_lowercase();
        let (name, lossy) = match normalized.strip_suffix(LOSSY_SUFFIX) {
            Some(base) => (base, true),
            None => (normalized.as_str(), false),
        };

        // Python-style spellings such as `latin-1` or `utf_8` drop the separator
        let encoding = Encoding::for_label(name.as_bytes())
            .or_else(|| Encoding::for_label(name.replace(['-', '_'], "").as_bytes()))
            .ok_or_else(|| AppError::InvalidInput(format!("Unsupported encoding: {}", label.trim())))?;
        Ok(Self { encoding, lossy })
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    fn decode(&self, raw: &[u8]) -> Result<String, AppError> {
        // A byte order mark overrides the requested encoding
        let (encoding, body) = match Encoding::for_bom(raw) {
            Some((encoding, bom_len)) => (encoding, &raw[bom_len..]),
            None => (self.encoding, raw),
        };

        if self.lossy {
            let (text, had_errors) = encoding.decode_without_bom_handling(body);
            if had_errors {
                tracing::warn!("Replaced malformed {} sequences while decoding", encoding.name());
            }
            return Ok(text.into_owned());
        }

        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
            .ok_or_else(|| AppError::ParseError(format!("File is not valid {}", encoding.name())))
    }
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub separator: u8,
    pub encoding: TextEncoding,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            encoding: TextEncoding::default(),
        }
    }
}

impl CsvOptions {
    /// Builds options from user-facing strings such as `--sep ";"` and `--encoding utf-8`.
    pub fn from_args(sep: &str, encoding: &str) -> Result<Self, AppError> {
        Ok(Self {
            separator: parse_separator(sep)?,
            encoding: TextEncoding::parse(encoding)?,
        })
    }
}

pub fn parse_separator(sep: &str) -> Result<u8, AppError> {
    match sep {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match sep.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(AppError::InvalidInput(format!(
            "Separator must be a single ASCII character, got {:?}",
            sep
        ))),
    }
}

pub fn load_csv(path: &Path, options: &CsvOptions) -> Result<DataFrame, AppError> {
    if !path.exists() {
        return Err(AppError::InvalidInput(format!("File '{}' not found", path.display())));
    }
    if !path.is_file() {
        return Err(AppError::InvalidInput(format!("'{}' is not a file", path.display())));
    }

    tracing::info!("Reading CSV from {}", path.display());
    let raw = std::fs::read(path)?;
    load_csv_bytes(Bytes::from(raw), options)
}

pub fn load_csv_bytes(raw: Bytes, options: &CsvOptions) -> Result<DataFrame, AppError> {
    let start = std::time::Instant::now();
    let text = options.encoding.decode(&raw)?;
    let null_values = NULL_MARKERS.iter().map(|m| m.to_string()).collect();

    let df = CsvReader::new(Cursor::new(text.into_bytes()))
        .has_header(true)
        .with_separator(options.separator)
        .with_null_values(Some(NullValues::AllColumns(null_values)))
        .infer_schema(None)
        .finish()
        .map_err(|e| {
            tracing::error!("Failed to parse CSV: {}", e);
            AppError::ParseError(format!("Failed to read CSV: {}", e))
        })?;

    tracing::info!(
        "Loaded {} rows x {} columns in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    );
    Ok(df)
}

pub fn ensure_not_empty(df: &DataFrame) -> Result<(), AppError> {
    if df.height() == 0 || df.width() == 0 {
        return Err(AppError::EmptyDataset);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InferredType {
    Int,
    Float,
    Bool,
    Text,
}

/// Builds a frame from `{"columns": {"name": [values, ...]}}`, inferring one
/// dtype per column from its non-null scalars.
pub fn frame_from_json_columns(payload: &Value) -> Result<DataFrame, AppError> {
    let columns = payload
        .get("columns")
        .ok_or_else(|| AppError::InvalidInput("Missing 'columns' field".to_string()))?
        .as_object()
        .ok_or_else(|| AppError::InvalidInput("'columns' must be an object".to_string()))?;

    let mut expected_len: Option<usize> = None;
    let mut series = Vec::with_capacity(columns.len());

    for (name, values) in columns {
        let values = values.as_array().ok_or_else(|| {
            AppError::InvalidInput(format!("Column '{}' must be an array of values", name))
        })?;

        match expected_len {
            Some(len) if len != values.len() => {
                return Err(AppError::InvalidInput(format!(
                    "Column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    len
                )));
            }
            _ => expected_len = Some(values.len()),
        }

        series.push(build_series(name, values)?);
    }

    DataFrame::new(series).map_err(|e| AppError::InvalidInput(format!("Failed to create DataFrame: {}", e)))
}

fn infer_type(name: &str, values: &[Value]) -> Result<InferredType, AppError> {
    let mut inferred: Option<InferredType> = None;
    for value in values {
        let current = match value {
            Value::Null => continue,
            Value::Bool(_) => InferredType::Bool,
            Value::Number(n) if n.is_i64() => InferredType::Int,
            Value::Number(_) => InferredType::Float,
            Value::String(_) => InferredType::Text,
            Value::Array(_) | Value::Object(_) => {
                return Err(AppError::InvalidInput(format!(
                    "Column '{}' contains an unsupported nested value",
                    name
                )));
            }
        };

        inferred = Some(match (inferred, current) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(InferredType::Int), InferredType::Float) | (Some(InferredType::Float), InferredType::Int) => {
                InferredType::Float
            }
            _ => InferredType::Text,
        });
    }

    Ok(inferred.unwrap_or(InferredType::Text))
}

fn build_series(name: &str, values: &[Value]) -> Result<Series, AppError> {
    let series = match infer_type(name, values)? {
        InferredType::Int => {
            let ints: Vec<Option<i64>> = values.iter().map(Value::as_i64).collect();
            Series::new(name, ints)
        }
        InferredType::Float => {
            let floats: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
            Series::new(name, floats)
        }
        InferredType::Bool => {
            let bools: Vec<Option<bool>> = values.iter().map(Value::as_bool).collect();
            Series::new(name, bools)
        }
        InferredType::Text => {
            let strings: Vec<Option<String>> = values
                .iter()
                .map(|v| match v {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(name, strings)
        }
    };
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_csv_bytes() {
        let raw = Bytes::from_static(b"age,city\n10,A\n,B\n30,A\n");
        let df = load_csv_bytes(raw, &CsvOptions::default()).unwrap();

        assert_eq!(df.shape(), (3, 2));
        assert_eq!(df.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn honours_separator_and_latin1() {
        let raw = Bytes::from(vec![b'n', b';', b'v', b'\n', b'1', b';', 0xE9, b'\n']);
        let options = CsvOptions::from_args(";", "latin-1").unwrap();
        let df = load_csv_bytes(raw, &options).unwrap();

        assert_eq!(df.shape(), (1, 2));
        let v = df.column("v").unwrap().str().unwrap().get(0);
        assert_eq!(v, Some("é"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let raw = Bytes::from(vec![b'a', b'\n', 0xFF, b'\n']);
        assert!(matches!(
            load_csv_bytes(raw, &CsvOptions::default()),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = load_csv(Path::new("/definitely/not/here.csv"), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn separator_parsing() {
        assert_eq!(parse_separator(",").unwrap(), b',');
        assert_eq!(parse_separator("\\t").unwrap(), b'\t');
        assert!(parse_separator(";;").is_err());
    }

    #[test]
    fn encoding_labels_resolve() {
        assert_eq!(TextEncoding::parse("utf8").unwrap().name(), "UTF-8");
        assert_eq!(TextEncoding::parse("cp1251").unwrap().name(), "windows-1251");
        assert_eq!(TextEncoding::parse(" Windows-1252 ").unwrap().name(), "windows-1252");
        assert_eq!(TextEncoding::parse("latin-1").unwrap().name(), "windows-1252");
        assert_eq!(TextEncoding::parse("utf_8").unwrap().name(), "UTF-8");
        assert!(matches!(
            TextEncoding::parse("klingon"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn decodes_cp1251() {
        // "имя,город\nАня,Омск\n"
        let raw = Bytes::from(vec![
            0xE8, 0xEC, 0xFF, b',', 0xE3, 0xEE, 0xF0, 0xEE, 0xE4, b'\n', 0xC0, 0xED, 0xFF, b',', 0xCE, 0xEC,
            0xF1, 0xEA, b'\n',
        ]);
        let options = CsvOptions::from_args(",", "cp1251").unwrap();
        let df = load_csv_bytes(raw, &options).unwrap();

        assert_eq!(df.get_column_names(), vec!["имя", "город"]);
        assert_eq!(df.column("город").unwrap().str().unwrap().get(0), Some("Омск"));
    }

    #[test]
    fn lossy_utf8_replaces_invalid_bytes() {
        let raw = Bytes::from(vec![b'a', b'\n', b'x', 0xFF, b'\n']);
        let options = CsvOptions::from_args(",", "utf-8-lossy").unwrap();
        let df = load_csv_bytes(raw, &options).unwrap();

        let value = df.column("a").unwrap().str().unwrap().get(0);
        assert_eq!(value, Some("x\u{FFFD}"));
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let raw = Bytes::from(b"\xEF\xBB\xBFid,v\n1,a\n".to_vec());
        let df = load_csv_bytes(raw, &CsvOptions::default()).unwrap();
        assert_eq!(df.get_column_names(), vec!["id", "v"]);
    }

    #[test]
    fn null_markers_load_as_missing() {
        let raw = Bytes::from_static(b"x,y\n1,a\nNA,b\n3,NA\n4,c\n");
        let df = load_csv_bytes(raw, &CsvOptions::default()).unwrap();

        let x = df.column("x").unwrap();
        assert!(x.dtype().is_numeric());
        assert_eq!(x.null_count(), 1);
        assert_eq!(df.column("y").unwrap().null_count(), 1);

        let missing = crate::services::eda::missing_table(&df).unwrap();
        assert_eq!(missing.get("x").unwrap().missing_count, 1);
        assert_eq!(missing.get("y").unwrap().missing_count, 1);
    }

    #[test]
    fn header_only_csv_is_empty() {
        match load_csv_bytes(Bytes::from_static(b"a,b\n"), &CsvOptions::default()) {
            Ok(df) => assert!(matches!(ensure_not_empty(&df), Err(AppError::EmptyDataset))),
            Err(err) => assert!(matches!(err, AppError::ParseError(_))),
        }
    }

    #[test]
    fn json_columns_infer_types() {
        let payload = json!({
            "columns": {
                "age": [10, 20, 30, null],
                "height": [140.5, 150, 160, 170],
                "city": ["A", "B", "A", null],
                "flag": [true, false, null, true],
                "mixed": [1, "x", null, 2.5]
            }
        });
        let df = frame_from_json_columns(&payload).unwrap();

        assert_eq!(df.get_column_names(), vec!["age", "height", "city", "flag", "mixed"]);
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("height").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("city").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("flag").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("mixed").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn json_columns_reject_bad_shapes() {
        let uneven = json!({"columns": {"a": [1, 2], "b": [1]}});
        assert!(matches!(frame_from_json_columns(&uneven), Err(AppError::InvalidInput(_))));

        let nested = json!({"columns": {"a": [[1], [2]]}});
        assert!(matches!(frame_from_json_columns(&nested), Err(AppError::InvalidInput(_))));

        let missing = json!({"rows": []});
        assert!(matches!(frame_from_json_columns(&missing), Err(AppError::InvalidInput(_))));

        let scalar = json!({"columns": {"a": 1}});
        assert!(matches!(frame_from_json_columns(&scalar), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn json_without_rows_is_empty() {
        let df = frame_from_json_columns(&json!({"columns": {"a": []}})).unwrap();
        assert!(matches!(ensure_not_empty(&df), Err(AppError::EmptyDataset)));

        let df = frame_from_json_columns(&json!({"columns": {}})).unwrap();
        assert!(matches!(ensure_not_empty(&df), Err(AppError::EmptyDataset)));
    }
}
