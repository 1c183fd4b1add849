//! Parameter Extraction
//!
//! Pulls named slots out of a routed utterance. Each slot has an ordered
//! list of candidate patterns; the first one yielding a non-empty capture
//! wins. Extraction never fails: a slot that is not found is `None`, and
//! deciding whether it was required is up to the handler.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::router::CommandKind;

/// Slots extracted from an utterance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Entity the command creates, archives or searches
    pub name: Option<String>,
    pub list_name: Option<String>,
    pub board_name: Option<String>,
    pub board_id: Option<String>,
    pub board_url: Option<String>,
    pub description: Option<String>,
    pub limit: Option<usize>,
    /// Canonical `YYYY-MM-DD`
    pub due_date: Option<String>,
}

impl Params {
    pub fn is_empty(&self) -> bool {
        *self == Params::default()
    }
}

/// Where a captured value stops: the start of another clause or the end
const TAIL: &str = r#"\s*["']?(?:\s+(?:na|no|da|do|em|para\s+[ao])\s+(?:lista|quadro|board)\b|\s+com\s+(?:a\s+)?(?:descri[çc][ãa]o|prazo|vencimento|id|url)\b|\s+(?:descri[çc][ãa]o|prazo|vencimento|vence|at[ée]|chamad[oa])\b|[.?!]?\s*$)"#;

/// Lazy value capture followed by `TAIL`
fn body() -> String {
    format!(r#"["']?(.+?){}"#, TAIL)
}

fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).expect("extraction pattern must compile"))
        .collect()
}

/// Captures that are really the start of another clause
static STOP_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:na|no|da|do|em|para\s+[ao])\s+(?:lista|quadro|board)\b|com\s+(?:[ao]\s+)?(?:descri[çc][ãa]o|prazo|vencimento|id|url|nome)\b|chamad[oa]\b|nome\b)",
    )
    .expect("stop prefix pattern must compile")
});

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(https?://[^\s"'<>]+)"#).expect("url pattern must compile"));

/// Board URLs carry the id right after `/b/`
static URL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/b/([A-Za-z0-9]+)").expect("board url pattern must compile"));

static BOARD_ID: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r#"\b(?:quadro|board)\s+(?:com\s+)?(?:o\s+)?id\s+["']?([A-Za-z0-9]+)"#.to_string()])
});

/// A URL only names the board when a board clause introduces it
static BOARD_URL: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#"\b(?:quadro|board)\s+(?:com\s+)?(?:a\s+|o\s+)?(?:url|link)\s+["']?(https?://[^\s"'<>]+)"#.to_string(),
    ])
});

static ANY_ID: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r#"\b(?:id|identificador)\s+["']?([A-Za-z0-9]+)"#.to_string()])
});

static BOARD_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(r"\b(?:quadro|board)\s+(?:chamado|com\s+nome|de\s+nome)\s+{}", body()),
        format!(r"\b(?:no|do|em|para\s+o)\s+(?:quadro|board)\s+{}", body()),
    ])
});

static LIST_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[format!(
        r"\b(?:da|na|do|no|para\s+a)\s+lista\s+(?:chamada\s+|com\s+nome\s+)?{}",
        body()
    )])
});

static NEW_LIST_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(r"\b(?:chamada|com\s+(?:o\s+)?nome|nome)\s+{}", body()),
        format!(r"\b(?:criar|adicionar|nova)\s+(?:uma\s+)?(?:nova\s+)?lista\s+{}", body()),
    ])
});

static CARD_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(
            r"\b(?:card|cartão|tarefa)\s+(?:chamad[oa]\s+|com\s+(?:o\s+)?nome\s+|nome\s+|t[íi]tulo\s+)?{}",
            body()
        ),
        format!(r"\b(?:chamad[oa]|com\s+(?:o\s+)?nome|t[íi]tulo)\s+{}", body()),
    ])
});

static SEARCH_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(r"\b(?:chamad[oa]|com\s+(?:o\s+)?nome)\s+{}", body()),
        format!(r"\b(?:card|cartão|tarefa)\s+{}", body()),
        r#"(?:buscar|localizar|encontrar|achar|procurar)[^"']*["']([^"']+)["']"#.to_string(),
    ])
});

static NEW_BOARD_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(r"\b(?:chamado|com\s+(?:o\s+)?nome|nome)\s+{}", body()),
        format!(r"\b(?:criar|adicionar|novo)\s+(?:um\s+)?quadro\s+{}", body()),
    ])
});

static DESCRIPTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[format!(r"\bdescri[çc][ãa]o\s*:?\s+{}", body())])
});

static LIMIT: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(?:últimas|ultimas|últimos|ultimos|limite)\s+(\d+)".to_string(),
        r"\b(\d+)\s+(?:últimas\s+|ultimas\s+)?atividades".to_string(),
    ])
});

static DUE_DATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    let date = r"(\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?)";
    compile(&[
        format!(
            r"\b(?:prazo|vencimento|vence(?:\s+em)?|at[ée]|entrega|data\s+limite)\s*:?\s+(?:(?:o\s+)?dia\s+|em\s+|de\s+)?{}",
            date
        ),
        r"(?:^|\s)(\d{1,2}/\d{1,2}(?:/\d{2,4})?)\b".to_string(),
    ])
});

fn clean(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim_end_matches(['.', ',', ';', ':', '!', '?'])
        .trim()
        .to_string()
}

/// First non-empty, non-clause capture over an ordered candidate list
fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let value = clean(caps.get(1)?.as_str());
        (!value.is_empty() && !STOP_PREFIX.is_match(&value)).then_some(value)
    })
}

/// Board id from a board URL (`https://host/b/<id>/<slug>`)
pub fn id_from_url(url: &str) -> Option<String> {
    URL_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Normalize `dd/mm`, `dd-mm`, `dd/mm/yy`, `dd/mm/yyyy` or `yyyy-mm-dd`
/// to `YYYY-MM-DD`; a missing year is taken from `today`
pub fn normalize_date(raw: &str, today: NaiveDate) -> Option<String> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split(['/', '-']).collect();

    let (day, month, year) = match parts.as_slice() {
        [y, m, d] if y.len() == 4 => (d.parse().ok()?, m.parse().ok()?, y.parse().ok()?),
        [d, m] => (d.parse().ok()?, m.parse().ok()?, today.year()),
        [d, m, y] => {
            let year: i32 = y.parse().ok()?;
            let year = match y.len() {
                2 => 2000 + year,
                4 => year,
                _ => return None,
            };
            (d.parse().ok()?, m.parse().ok()?, year)
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format("%Y-%m-%d").to_string())
}

/// Board slots; `bare_url` accepts a URL without a board clause in front
fn extract_board(text: &str, params: &mut Params, bare_url: bool) {
    let url = first_capture(&BOARD_URL, text)
        .or_else(|| bare_url.then(|| first_capture(std::slice::from_ref(&*URL), text)).flatten());

    if let Some(id) = first_capture(&BOARD_ID, text) {
        params.board_id = Some(id);
    } else if let Some(url) = url {
        params.board_id = id_from_url(&url);
        params.board_url = Some(url);
    } else {
        params.board_name = first_capture(&BOARD_NAME, text);
    }
}

/// Extract slots for `kind` using today's date for year-less dates
pub fn extract(kind: CommandKind, raw_text: &str) -> Params {
    extract_on(kind, raw_text, Local::now().date_naive())
}

/// Extract slots for `kind`, resolving year-less dates against `today`
pub fn extract_on(kind: CommandKind, raw_text: &str, today: NaiveDate) -> Params {
    let text = raw_text.trim();
    let mut params = Params::default();

    match kind {
        CommandKind::ListLists | CommandKind::RecentActivity => {
            extract_board(text, &mut params, kind == CommandKind::ListLists);
            if kind == CommandKind::RecentActivity {
                params.limit = first_capture(&LIMIT, text).and_then(|v| v.parse().ok());
            }
        }
        CommandKind::ListCards => {
            params.list_name = first_capture(&LIST_NAME, text);
            extract_board(text, &mut params, false);
        }
        CommandKind::CreateList => {
            params.name = first_capture(&NEW_LIST_NAME, text);
            extract_board(text, &mut params, false);
        }
        CommandKind::CreateCard => {
            params.list_name = first_capture(&LIST_NAME, text);
            params.name = first_capture(&CARD_NAME, text);
            params.description = first_capture(&DESCRIPTION, text);
            params.due_date = first_capture(&DUE_DATE, text).and_then(|d| normalize_date(&d, today));
            extract_board(text, &mut params, false);
        }
        CommandKind::ArchiveCard => {
            params.name = first_capture(&CARD_NAME, text);
            params.list_name = first_capture(&LIST_NAME, text);
        }
        CommandKind::CreateBoard => {
            params.name = first_capture(&NEW_BOARD_NAME, text);
            params.description = first_capture(&DESCRIPTION, text);
        }
        CommandKind::DeleteBoard => {
            if let Some(url) = first_capture(std::slice::from_ref(&*URL), text) {
                params.board_id = id_from_url(&url);
                params.board_url = Some(url);
            } else if let Some(id) = first_capture(&ANY_ID, text) {
                params.board_id = Some(id);
            } else {
                params.board_name = first_capture(&BOARD_NAME, text);
            }
        }
        CommandKind::SearchCard => {
            params.name = first_capture(&SEARCH_NAME, text);
            extract_board(text, &mut params, false);
        }
        CommandKind::ListBoards
        | CommandKind::Confirm
        | CommandKind::UnknownDomain
        | CommandKind::NotACommand => {}
    }

    params
}
