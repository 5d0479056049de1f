// ==========================================
// 订阅财务后台 - 文件解析器实现
// ==========================================
// 职责: CSV / XLSX → RawBatch（纯解析，不含业务规则）
// 支持: CSV (.csv, UTF-8, 容忍 BOM) / Excel (.xlsx, 第一个工作表)
// 约定: 首行固定为表头，表头原样保留（标准化由映射推断负责）
// ==========================================

use crate::domain::record::{RawBatch, RawRecord};
use crate::domain::types::CellValue;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ==========================================
// CancelFlag - 解析取消标志
// ==========================================
// 克隆共享同一标志；解析器每处理一行检查一次
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> ImporterResult<()> {
        if self.is_cancelled() {
            Err(ImportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// 取小写扩展名
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 校验扩展名与文件存在性
fn check_file(path: &Path, expected_ext: &str) -> ImporterResult<()> {
    let ext = extension_of(path);
    if ext != expected_ext {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// 表头整理
// ==========================================
// 空表头列忽略；重复表头保留第一次出现的列
// 返回 (源列序号, 表头) 列表
fn select_columns(raw_headers: &[String]) -> Vec<(usize, String)> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for (idx, header) in raw_headers.iter().enumerate() {
        if header.is_empty() {
            warn!(column = idx, "忽略空表头列");
            continue;
        }
        if !seen.insert(header.clone()) {
            warn!(column = idx, header = %header, "重复表头，保留首次出现的列");
            continue;
        }
        columns.push((idx, header.clone()));
    }
    columns
}

/// 按已选列组装行；行长度不足时尾部列视为不存在
fn build_record<F>(headers: &Arc<[String]>, columns: &[(usize, String)], cell_at: F) -> RawRecord
where
    F: Fn(usize) -> Option<CellValue>,
{
    let cells = columns
        .iter()
        .map_while(|(idx, _)| cell_at(*idx))
        .collect();
    RawRecord::new(Arc::clone(headers), cells)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从内存字节解析（已去除 BOM）
    pub fn parse_bytes(&self, bytes: &[u8], cancel: &CancelFlag) -> ImporterResult<RawBatch> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头（原样，不 trim）
        let raw_headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let columns = select_columns(&raw_headers);
        if columns.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        let headers: Arc<[String]> = columns.iter().map(|(_, h)| h.clone()).collect();

        // 读取所有行
        let mut records = Vec::new();
        let mut skipped_blank = 0usize;
        for result in reader.records() {
            cancel.check()?;
            let row = result?;
            let record = build_record(&headers, &columns, |idx| row.get(idx).map(CellValue::text));

            // 跳过完全空白的行
            if record.is_blank() {
                skipped_blank += 1;
                continue;
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        debug!(rows = records.len(), skipped_blank, "CSV 解析完成");
        Ok(RawBatch::new(headers, records))
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_batch(&self, file_path: &Path, cancel: &CancelFlag) -> ImporterResult<RawBatch> {
        check_file(file_path, "csv")?;
        let bytes = std::fs::read(file_path)?;
        self.parse_bytes(&bytes, cancel)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// Excel 单元格 → CellValue（保留数值 / 布尔 / 空值类型）
pub fn cell_value_from_excel(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        // 日期按 Excel 序列号保留，格式化不属于本层
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => {
            debug!(error = ?e, "Excel 单元格错误值按空值处理");
            CellValue::Null
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_batch(&self, file_path: &Path, cancel: &CancelFlag) -> ImporterResult<RawBatch> {
        check_file(file_path, "xlsx")?;

        // 打开 Excel 文件
        let mut workbook: Xlsx<_> = open_workbook(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptyFile)?;
        let raw_headers: Vec<String> = header_row.iter().map(|cell| cell.to_string()).collect();
        let columns = select_columns(&raw_headers);
        if columns.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        let headers: Arc<[String]> = columns.iter().map(|(_, h)| h.clone()).collect();

        // 读取数据行
        let mut records = Vec::new();
        for data_row in rows {
            cancel.check()?;
            let record = build_record(&headers, &columns, |idx| {
                data_row.get(idx).map(cell_value_from_excel)
            });

            // 跳过完全空白的行
            if record.is_blank() {
                continue;
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        debug!(sheet = %sheet_name, rows = records.len(), "Excel 解析完成");
        Ok(RawBatch::new(headers, records))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct UniversalFileParser {
    max_file_size_bytes: Option<u64>,
}

impl UniversalFileParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置文件大小上限（字节）
    pub fn with_max_file_size(mut self, max_bytes: u64) -> Self {
        self.max_file_size_bytes = Some(max_bytes);
        self
    }

    /// 同步解析（不可取消）
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImporterResult<RawBatch> {
        self.parse_with_cancel(file_path.as_ref(), &CancelFlag::new())
    }

    /// 同步解析（可取消）
    ///
    /// # 校验顺序
    /// 1. 扩展名（在任何映射工作之前快速失败）
    /// 2. 文件存在
    /// 3. 文件大小
    pub fn parse_with_cancel(&self, path: &Path, cancel: &CancelFlag) -> ImporterResult<RawBatch> {
        let ext = extension_of(path);
        let parser: &dyn FileParser = match ext.as_str() {
            "csv" => &CsvParser,
            "xlsx" => &ExcelParser,
            _ => return Err(ImportError::UnsupportedFormat(ext)),
        };

        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        if let Some(max_bytes) = self.max_file_size_bytes {
            let size_bytes = std::fs::metadata(path)?.len();
            if size_bytes > max_bytes {
                return Err(ImportError::FileTooLarge {
                    size_bytes,
                    max_bytes,
                });
            }
        }

        let batch = parser.parse_to_raw_batch(path, cancel)?;
        info!(
            file = %path.display(),
            headers = batch.headers().len(),
            total_rows = batch.len(),
            "文件解析完成"
        );
        Ok(batch)
    }

    /// 在阻塞线程池中解析，可通过 CancelFlag 中断
    pub async fn parse_in_background(
        &self,
        file_path: PathBuf,
        cancel: CancelFlag,
    ) -> ImporterResult<RawBatch> {
        let parser = self.clone();
        tokio::task::spawn_blocking(move || parser.parse_with_cancel(&file_path, &cancel))
            .await
            .map_err(|e| ImportError::InternalError(format!("解析任务异常终止: {}", e)))?
    }
}
