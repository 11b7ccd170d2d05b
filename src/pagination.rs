//! Page-number pagination: `page` (from 1) and `size` (1..=100) query params.

use crate::error::AppError;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub size: u64,
}

impl Default for PageParams {
    fn default() -> Self {
        PageParams {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn parse_bounded(params: &HashMap<String, String>, name: &str, default: u64, max: Option<u64>) -> Result<u64, AppError> {
    let Some(raw) = params.get(name) else {
        return Ok(default);
    };
    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::invalid("query", name, "value is not a valid integer", "type_error.integer"))?;
    if n < 1 {
        return Err(AppError::invalid(
            "query",
            name,
            "ensure this value is greater than or equal to 1",
            "value_error.number.not_ge",
        ));
    }
    let n = n as u64;
    if let Some(max) = max {
        if n > max {
            return Err(AppError::invalid(
                "query",
                name,
                format!("ensure this value is less than or equal to {}", max),
                "value_error.number.not_le",
            ));
        }
    }
    Ok(n)
}

impl PageParams {
    /// The window offset must fit a signed 64-bit SQL OFFSET.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let page = parse_bounded(params, "page", 1, None)?;
        let size = parse_bounded(params, "size", DEFAULT_PAGE_SIZE, Some(MAX_PAGE_SIZE))?;
        match (page - 1).checked_mul(size) {
            Some(offset) if offset <= i64::MAX as u64 => Ok(PageParams { page, size }),
            _ => Err(AppError::invalid(
                "query",
                "page",
                format!("page {} with size {} is out of range", page, size),
                "value_error.number.not_le",
            )),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> u64 {
        self.size
    }

    /// Number of pages needed for `total` items.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.size)
    }
}
