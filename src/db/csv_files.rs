use super::partition_store::PartitionSink;
use crate::error::ReconResult;
use crate::models::{DocketRecord, PartitionId, KNOWN_FIELDS};
use csv::{ReaderBuilder, Writer};
use indexmap::IndexSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const EXTENSION: &str = "csv";

/// 每个分区一个 CSV 文件，首行为表头
#[derive(Debug, Clone)]
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    /// 目录不存在时自动创建
    pub fn new(dir: impl Into<PathBuf>) -> ReconResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            tracing::info!("Created folder: {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &PartitionId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, EXTENSION))
    }
}

impl PartitionSink for CsvDirSink {
    fn load(&self) -> ReconResult<Vec<(PartitionId, Vec<DocketRecord>)>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == EXTENSION))
            .collect();
        paths.sort();

        let mut partitions = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!("Skipping partition file with non UTF-8 name: {}", path.display());
                continue;
            };
            let records = read_records(File::open(&path)?)?;
            tracing::debug!("读取分区 {} ({} 行)", stem, records.len());
            partitions.push((PartitionId::new(stem), records));
        }
        Ok(partitions)
    }

    /// 先写临时文件再改名，读者不会看到写了一半的分区
    fn write(&self, id: &PartitionId, records: &[DocketRecord]) -> ReconResult<()> {
        let target = self.path_for(id);
        let staging = target.with_extension("csv.tmp");

        let mut file = File::create(&staging)?;
        write_records(&mut file, records)?;
        file.sync_all()?;
        fs::rename(&staging, &target)?;
        Ok(())
    }
}

/// 表头：有值的有名字段在前，额外列按首次出现顺序在后
pub fn header_for(records: &[DocketRecord]) -> Vec<String> {
    let mut columns: IndexSet<&str> = IndexSet::new();
    for field in KNOWN_FIELDS {
        if records
            .iter()
            .any(|r| r.get(field).is_some_and(|v| !v.is_empty()))
        {
            columns.insert(field);
        }
    }
    for record in records {
        columns.extend(record.extra.keys().map(String::as_str));
    }
    if columns.is_empty() && !records.is_empty() {
        columns.insert(KNOWN_FIELDS[0]);
    }
    columns.into_iter().map(str::to_string).collect()
}

pub fn write_records<W: Write>(out: W, records: &[DocketRecord]) -> ReconResult<()> {
    let header = header_for(records);
    if header.is_empty() {
        return Ok(());
    }

    let mut writer = Writer::from_writer(out);
    writer.write_record(&header)?;
    for record in records {
        writer.write_record(header.iter().map(|c| record.get(c).unwrap_or_default()))?;
    }
    writer.flush()?;
    Ok(())
}

/// 缺失的单元格按空串处理，多出的单元格丢弃
pub fn read_records<R: Read>(input: R) -> ReconResult<Vec<DocketRecord>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
    let header = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(DocketRecord::from_cells(
            header
                .iter()
                .enumerate()
                .map(|(i, column)| (column, row.get(i).unwrap_or_default())),
        ));
    }
    Ok(records)
}
