// Table I/O - CSV exports in, canonical records out
use crate::columns::{ColumnAliases, REFERRING_DOMAIN, SOURCE_URL};
use crate::error::{LinkvetError, Result};
use crate::record::{CellValue, Record};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

/// An input table after header canonicalization
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub source: Option<PathBuf>,
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn read_csv(path: &Path, aliases: &ColumnAliases) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut table = Self::from_reader(file, aliases)?;
        table.source = Some(path.to_path_buf());
        debug!(
            "Loaded {} rows, {} columns from {}",
            table.records.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, aliases: &ColumnAliases) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let raw_headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
        let canonical = aliases.canonicalize_all(&raw_headers);

        // First column wins when two aliases collapse onto one name
        let mut headers: Vec<String> = Vec::with_capacity(canonical.len());
        let mut keep: Vec<bool> = Vec::with_capacity(canonical.len());
        for name in canonical {
            if headers.contains(&name) {
                debug!("Dropping duplicate column '{}'", name);
                keep.push(false);
            } else {
                headers.push(name);
                keep.push(true);
            }
        }

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let mut record = Record::new();
            let mut header_iter = headers.iter();
            for (index, kept) in keep.iter().enumerate() {
                if !kept {
                    continue;
                }
                let Some(name) = header_iter.next() else {
                    break;
                };
                let value = row.get(index).map(CellValue::parse).unwrap_or(CellValue::Empty);
                record.insert(name, value);
            }
            records.push(record);
        }

        Ok(Self {
            source: None,
            headers,
            records,
        })
    }

    pub fn from_records(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            source: None,
            headers,
            records,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        for column in columns {
            if !self.has_column(column) {
                return Err(LinkvetError::MissingColumn {
                    column: column.to_string(),
                    path: self.source.clone().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    /// Derive `Referring Domain` from `Source url` when the export lacks it
    pub fn add_referring_domain_column(&mut self) {
        if self.has_column(REFERRING_DOMAIN) || !self.has_column(SOURCE_URL) {
            return;
        }
        for record in &mut self.records {
            let domain = extract_domain_from_url(&record.text(SOURCE_URL));
            record.insert(REFERRING_DOMAIN, CellValue::Text(domain));
        }
        self.headers.push(REFERRING_DOMAIN.to_string());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Lowercased host of a URL without a leading `www.`; "" when there is no host.
///
/// Port and user info are not part of the host. Scheme-relative `//host/..`
/// values are read as http.
pub fn extract_domain_from_url(url: &str) -> String {
    let url = url.trim();
    let parsed = match url.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("http://{}", rest)),
        None => Url::parse(url),
    };
    let Some(host) = parsed.ok().and_then(|u| u.host_str().map(str::to_lowercase)) else {
        return String::new();
    };
    match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => host,
    }
}

/// Target domain of a SEMRUSH export, taken from its file name.
///
/// `example.com-backlinks (2).csv` gives `example.com`.
pub fn domain_from_file_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let base = if file_name.contains("-backlinks") {
        file_name
    } else {
        path.file_stem()?.to_str()?
    };
    let domain = base
        .split("-backlinks")
        .next()
        .unwrap_or(base)
        .split(" (")
        .next()
        .unwrap_or(base)
        .trim();
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_string())
    }
}

/// Input files under `path` whose names match any of `patterns`.
///
/// A file path is returned as is. Results are sorted.
pub fn discover_files(path: &Path, patterns: &[String], recursive: bool) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(LinkvetError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Path does not exist: {}", path.display()),
        )));
    }

    let compiled = patterns
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| compiled.iter().any(|p| p.matches(name)))
        })
        .map(|e| e.into_path())
        .collect();

    if files.is_empty() {
        return Err(LinkvetError::NoInputFiles(path.to_path_buf()));
    }

    files.sort();
    debug!("Found {} input files in {}", files.len(), path.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SEMRUSH_CSV: &str = "\
Page AS,Source title,Source URL,Target URL,Anchor,External Links,NoFollow
12,Best casino bonuses,https://www.casino-hub.net/page,https://target.com/,casino,340,FALSE
40,Gardening tips,https://blog.garden.org/post?id=1,https://target.com/,read more,12,TRUE
";

    #[test]
    fn test_read_canonicalizes_headers_and_coerces_cells() {
        let table = Table::from_reader(SEMRUSH_CSV.as_bytes(), &ColumnAliases::semrush()).unwrap();
        assert_eq!(
            table.headers,
            vec![
                "Page ascore",
                "Source title",
                "Source url",
                "Target url",
                "Anchor",
                "External links",
                "Nofollow"
            ]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records[0].get("Page ascore"),
            Some(&CellValue::Integer(12))
        );
        assert_eq!(
            table.records[1].get("Nofollow"),
            Some(&CellValue::Bool(true))
        );
    }

    #[test]
    fn test_short_rows_fill_with_empty() {
        let csv = "Anchor,Source URL\nonly anchor\n";
        let table = Table::from_reader(csv.as_bytes(), &ColumnAliases::semrush()).unwrap();
        assert_eq!(table.records[0].get("Source url"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_duplicate_alias_keeps_first_column() {
        let csv = "Source URL,Source,Anchor\nhttps://a.com/,https://b.com/,x\n";
        let table = Table::from_reader(csv.as_bytes(), &ColumnAliases::semrush()).unwrap();
        assert_eq!(table.headers, vec!["Source url", "Anchor"]);
        assert_eq!(table.records[0].text("Source url"), "https://a.com/");
        assert_eq!(table.records[0].text("Anchor"), "x");
    }

    #[test]
    fn test_add_referring_domain_column() {
        let mut table =
            Table::from_reader(SEMRUSH_CSV.as_bytes(), &ColumnAliases::semrush()).unwrap();
        table.add_referring_domain_column();
        assert!(table.has_column("Referring Domain"));
        assert_eq!(table.records[0].text("Referring Domain"), "casino-hub.net");
        assert_eq!(table.records[1].text("Referring Domain"), "blog.garden.org");
    }

    #[test]
    fn test_require_columns() {
        let table = Table::from_reader(SEMRUSH_CSV.as_bytes(), &ColumnAliases::semrush()).unwrap();
        assert!(table.require_columns(&["Source url", "Page ascore"]).is_ok());
        assert!(matches!(
            table.require_columns(&["Lost link"]),
            Err(LinkvetError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_extract_domain_from_url() {
        assert_eq!(extract_domain_from_url("https://www.example.com/a/b"), "example.com");
        assert_eq!(extract_domain_from_url("http://sub.example.com?x=1"), "sub.example.com");
        assert_eq!(extract_domain_from_url("//cdn.example.com/x"), "cdn.example.com");
        assert_eq!(extract_domain_from_url("example.com/path"), "");
        assert_eq!(extract_domain_from_url(""), "");
        assert_eq!(extract_domain_from_url("mailto:someone@example.com"), "");
    }

    #[test]
    fn test_extract_domain_ignores_port_user_and_case() {
        assert_eq!(extract_domain_from_url("https://www.casino.com:8080/p"), "casino.com");
        assert_eq!(extract_domain_from_url("HTTPS://WWW.Casino.com/p"), "casino.com");
        assert_eq!(extract_domain_from_url("https://user@www.casino.com/"), "casino.com");
        assert_eq!(
            extract_domain_from_url("https://user:pw@Casino.com:443/?q=1"),
            "casino.com"
        );
    }

    #[test]
    fn test_domain_from_file_name() {
        assert_eq!(
            domain_from_file_name(Path::new("/x/example.com-backlinks (2).csv")),
            Some("example.com".to_string())
        );
        assert_eq!(
            domain_from_file_name(Path::new("shop.co.uk-backlinks.csv")),
            Some("shop.co.uk".to_string())
        );
        assert_eq!(
            domain_from_file_name(Path::new("plain.com.csv")),
            Some("plain.com".to_string())
        );
    }

    #[test]
    fn test_discover_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.com-backlinks.csv"), "Anchor\n").unwrap();
        fs::write(dir.path().join("a.com-backlinks.csv"), "Anchor\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.com-backlinks.csv"), "Anchor\n").unwrap();

        let patterns = vec!["*-backlinks.csv".to_string()];
        let flat = discover_files(dir.path(), &patterns, false).unwrap();
        let names: Vec<String> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.com-backlinks.csv", "b.com-backlinks.csv"]);

        let deep = discover_files(dir.path(), &patterns, true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_discover_files_empty_dir_is_error() {
        let dir = TempDir::new().unwrap();
        let patterns = vec!["*.csv".to_string()];
        assert!(matches!(
            discover_files(dir.path(), &patterns, false),
            Err(LinkvetError::NoInputFiles(_))
        ));
    }
}
