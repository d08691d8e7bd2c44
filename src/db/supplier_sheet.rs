use crate::error::{ReconError, ReconResult};
use crate::models::SupplierRow;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// 把请求给出的相对路径解析到供应商目录 `base` 内
///
/// 绝对路径、`..` 以及经符号链接跑出目录的路径都按 InvalidInput 拒绝。
pub fn resolve_sheet_path(base: &Path, requested: &Path) -> ReconResult<PathBuf> {
    let relative = requested
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !relative {
        return Err(ReconError::invalid(format!(
            "supplier sheet {} must be relative to the upload folder",
            requested.display()
        )));
    }

    let root = base.canonicalize().map_err(|e| {
        ReconError::invalid(format!("supplier folder {} unavailable: {}", base.display(), e))
    })?;
    let resolved = root.join(requested).canonicalize().map_err(|e| {
        ReconError::invalid(format!("cannot open supplier sheet {}: {}", requested.display(), e))
    })?;
    if !resolved.starts_with(&root) || !resolved.is_file() {
        return Err(ReconError::invalid(format!(
            "supplier sheet {} is outside the upload folder",
            requested.display()
        )));
    }
    Ok(resolved)
}

/// 读取供应商目录下的清单文件：第 `header_row` 行 (从 1 开始) 是表头，之后是数据
pub fn load_supplier_sheet(
    base: &Path,
    requested: &Path,
    header_row: usize,
) -> ReconResult<Vec<SupplierRow>> {
    let path = resolve_sheet_path(base, requested)?;
    let file = File::open(&path).map_err(|e| {
        ReconError::invalid(format!("cannot open supplier sheet {}: {}", requested.display(), e))
    })?;
    let rows = read_supplier_rows(file, header_row)?;
    tracing::info!("Loaded {} supplier rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn read_supplier_rows<R: Read>(input: R, header_row: usize) -> ReconResult<Vec<SupplierRow>> {
    if header_row == 0 {
        return Err(ReconError::invalid("header row is 1-based"));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let lines: Vec<StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .map_err(|e| ReconError::invalid(format!("unreadable supplier sheet: {}", e)))?;

    let Some(header) = lines.get(header_row - 1) else {
        return Err(ReconError::invalid(format!(
            "supplier sheet has no header row {}",
            header_row
        )));
    };

    // 表格宽度取表头与数据行中最长的一行
    let width = lines[header_row - 1..]
        .iter()
        .map(StringRecord::len)
        .max()
        .unwrap_or(0);
    let headers: Vec<String> = (0..width)
        .map(|c| match header.get(c).map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("EMPTY_{}", c),
        })
        .collect();

    let rows: Vec<SupplierRow> = lines[header_row..]
        .iter()
        .filter(|line| line.iter().any(|cell| !cell.trim().is_empty()))
        .map(|line| {
            SupplierRow::from_cells(
                headers
                    .iter()
                    .enumerate()
                    .map(|(c, h)| (h.clone(), line.get(c).unwrap_or_default().to_string())),
            )
        })
        .collect();

    if rows.is_empty() {
        return Err(ReconError::invalid("No data rows found after header row"));
    }
    Ok(rows)
}
