//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 페이지별 텍스트를 추출합니다.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::LoadError;

/// PDF에서 페이지별 텍스트 추출
///
/// (페이지 번호, 텍스트) 목록을 반환합니다. 페이지 번호는 1부터 시작하며
/// 빈 페이지는 제외됩니다 (번호는 유지).
pub fn extract_pages(path: &Path) -> Result<Vec<(u32, String)>, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| LoadError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
        return Ok(vec![]);
    }

    Ok(split_pages(&text))
}

fn page_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 예: "--- Page 1 ---"
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
            .expect("page marker regex is valid")
    })
}

/// 추출된 텍스트를 페이지별로 분리
fn split_pages(text: &str) -> Vec<(u32, String)> {
    // 폼피드 문자 (\x0c)가 페이지 경계
    if text.contains('\x0c') {
        return number_pages(text.split('\x0c'));
    }

    let marker = page_marker();
    if marker.is_match(text) {
        let pages = number_pages(marker.split(text));
        if pages.len() > 1 {
            return pages;
        }
    }

    // 분리 실패 - 전체를 하나의 페이지로
    vec![(1, text.trim().to_string())]
}

fn number_pages<'a>(pages: impl Iterator<Item = &'a str>) -> Vec<(u32, String)> {
    pages
        .enumerate()
        .map(|(i, page)| (i as u32 + 1, page.trim().to_string()))
        .filter(|(_, page)| !page.is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_with_formfeed() {
        let pages = split_pages("Page 1 content\x0cPage 2 content\x0cPage 3 content");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], (1, "Page 1 content".to_string()));
        assert_eq!(pages[2], (3, "Page 3 content".to_string()));
    }

    #[test]
    fn test_blank_page_keeps_numbering() {
        let pages = split_pages("first\x0c   \x0cthird\x0c");
        assert_eq!(
            pages,
            vec![(1, "first".to_string()), (3, "third".to_string())]
        );
    }

    #[test]
    fn test_split_pages_with_markers() {
        let text = "intro text\n--- Page 2 ---\nsecond page\n--- Page 3 ---\nthird page";
        let pages = split_pages(text);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1], (2, "second page".to_string()));
    }

    #[test]
    fn test_split_pages_no_separator() {
        let pages = split_pages("Just some text without page breaks");
        assert_eq!(pages, vec![(1, "Just some text without page breaks".to_string())]);
    }

    #[test]
    fn test_unparseable_pdf_is_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        let result = extract_pages(&path);
        assert!(matches!(result, Err(LoadError::Pdf { .. })));
    }
}
