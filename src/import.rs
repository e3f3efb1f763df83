use serde::Deserialize;

/// One catalog row from a books CSV (`Title, Author, Genre, Default_Location`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedBook {
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub default_location: Option<String>,
}

#[derive(Debug, Default)]
pub struct ParsedBooks {
    pub books: Vec<ImportedBook>,
    /// Rows without a title
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct BookRow {
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Author", default)]
    author: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Default_Location", default)]
    default_location: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_books_csv(content: &[u8]) -> Result<ParsedBooks, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers = rdr
        .headers()
        .map_err(|e| format!("CSV parse error: {}", e))?;
    if !headers.iter().any(|h| h == "Title") {
        return Err("CSV is missing the Title column".to_string());
    }

    let mut parsed = ParsedBooks::default();

    for result in rdr.deserialize() {
        let record: BookRow = result.map_err(|e| format!("CSV parse error: {}", e))?;

        match clean(record.title) {
            Some(title) => parsed.books.push(ImportedBook {
                title,
                author: clean(record.author),
                genre: clean(record.genre),
                default_location: clean(record.default_location),
            }),
            None => parsed.skipped += 1,
        }
    }

    Ok(parsed)
}
