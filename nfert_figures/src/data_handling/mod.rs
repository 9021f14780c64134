pub mod workbook;
pub mod reference_map;
pub mod province_sheet;
pub mod yield_table;
