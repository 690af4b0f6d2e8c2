// Ballots in an Excel spreadsheet, with the same layout as the CSV files.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::poll::{io_common::make_default_id, *};

pub fn read_excel_ballots(path: &str, source: &BallotSource) -> PollResult<Vec<ParsedBallot>> {
    let wrange = get_range(path, source)?;
    read_range(&wrange, path, source)
}

fn get_range(path: &str, source: &BallotSource) -> PollResult<Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &source.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange = match &source.excel_worksheet_name {
        // A worksheet name was provided, use it.
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?,
    };
    wrange.context(OpeningExcelSnafu { path })
}

fn read_range(
    wrange: &Range<DataType>,
    path: &str,
    source: &BallotSource,
) -> PollResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let id_idx_o = source.id_column_index_int()?;
    let choices_start_col = source.first_vote_column_index()?;
    let first_row = source.first_vote_row_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in wrange.rows().enumerate().skip(first_row) {
        let lineno = idx + 1;
        let mut cells: Vec<String> = Vec::new();
        for cell in row.iter() {
            cells.push(cell_to_string(cell, lineno)?);
        }
        if cells.iter().all(|s| s.trim().is_empty()) {
            debug!("read_range: skipping empty line {}", lineno);
            continue;
        }
        let id = match id_idx_o {
            Some(id_idx) => cells.get(id_idx).cloned().unwrap_or_default(),
            None => default_id(lineno),
        };
        let choices: Vec<String> = cells.into_iter().skip(choices_start_col).collect();
        debug!("read_range: lineno: {:?} row: {:?}", lineno, &choices);
        res.push(ParsedBallot { id, choices });
    }
    Ok(res)
}

// Rank positions typed in a spreadsheet usually come back as floats.
fn cell_to_string(cell: &DataType, lineno: usize) -> PollResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Empty => Ok(String::new()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        x => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", x),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::String(" A ".to_string()), 1).unwrap(), "A");
        assert_eq!(cell_to_string(&DataType::Float(2.0), 1).unwrap(), "2");
        assert_eq!(cell_to_string(&DataType::Int(3), 1).unwrap(), "3");
        assert_eq!(cell_to_string(&DataType::Empty, 1).unwrap(), "");
        assert!(matches!(
            cell_to_string(&DataType::Float(1.5), 4),
            Err(PollError::ExcelWrongCellType { lineno: 4, .. })
        ));
        assert!(cell_to_string(&DataType::Bool(true), 1).is_err());
    }

    #[test]
    fn range_layout() {
        let mut range: Range<DataType> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), DataType::String("voter".to_string()));
        range.set_value((0, 1), DataType::String("A".to_string()));
        range.set_value((0, 2), DataType::String("B".to_string()));
        range.set_value((1, 0), DataType::String("alice".to_string()));
        range.set_value((1, 1), DataType::Float(2.0));
        range.set_value((1, 2), DataType::Float(1.0));
        let source = BallotSource {
            id_column_index: Some(json!("A")),
            _first_vote_column_index: Some(json!("B")),
            _first_vote_row_index: Some(json!(2)),
            ranking_format: Some("positions".to_string()),
            ..BallotSource::simple("xlsx", "lunch.xlsx")
        };
        let res = read_range(&range, "lunch.xlsx", &source).unwrap();
        assert_eq!(
            res,
            vec![ParsedBallot {
                id: "alice".to_string(),
                choices: vec!["2".to_string(), "1".to_string()],
            }]
        );
    }
}
