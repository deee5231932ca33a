//! Literal header and scalar-value regions per layout.

use super::{FieldSpec, TemplateId};

const ANY: &str = "";
const DECIMAL: &str = ".0123456789";
const SIGNED: &str = "-0123456789.";
const DATE: &str = "0123456789/";
const DATE_SPACED: &str = "0123456789 /";
const BIRTH_DATE_AGE: &str = "0123456789 ()/";
const GENDER: &str = "MF";
const EYE: &str = "OSD";

type Row = (&'static str, [u32; 4], &'static str);

const INFO_ONE: &[Row] = &[
    ("Patient", [46, 5, 140, 16], ANY),
    ("DOB_age", [60, 18, 140, 16], BIRTH_DATE_AGE),
    ("Algorithm_Ver", [707, 18, 140, 16], ANY),
    ("Exam_date_OD", [121, 563, 84, 16], DATE),
    ("Exam_date_OS", [752, 563, 84, 16], DATE),
    ("Gender", [361, 31, 60, 16], GENDER),
    ("Eye", [16, 60, 32, 70], EYE),
    ("Eye_2", [890, 64, 32, 70], EYE),
    ("MRR", [161, 421, 46, 29], ANY),
];

const INFO_TWO: &[Row] = &[
    ("Patient", [45, 4, 140, 16], ANY),
    ("DOB_age", [58, 19, 140, 16], BIRTH_DATE_AGE),
    ("Algorithm_Ver", [390, 19, 140, 16], ANY),
    ("Exam_date", [694, 18, 140, 16], DATE_SPACED),
    ("Gender", [362, 32, 60, 16], GENDER),
    ("Eye", [6, 65, 32, 70], EYE),
    ("MRR", [173, 304, 46, 29], ANY),
];

const EXAM_ONE: &[Row] = &[
    ("SSI_OD", [250, 563, 60, 16], DECIMAL),
    ("SSI_OS", [880, 563, 60, 16], DECIMAL),
    ("Net_Power_OD", [53, 488, 41, 18], DECIMAL),
    ("Anterior_Power_OD", [107, 489, 41, 18], DECIMAL),
    ("Posterior_Power_OD", [158, 491, 41, 18], SIGNED),
    ("Anterior_R_OD", [61, 533, 33, 18], DECIMAL),
    ("Posterior_R_OD", [159, 532, 33, 18], DECIMAL),
    ("Pachy_SNIT_Pachmetry_OD", [286, 461, 38, 18], SIGNED),
    ("Pachy_SNIT_Pachmetry_OS", [326, 462, 38, 18], SIGNED),
    ("Pachy_SI_Pachmetry_OD", [426, 461, 38, 18], SIGNED),
    ("Pachy_SI_Pachmetry_OS", [466, 461, 38, 18], SIGNED),
    ("Pachy_Min_Pachmetry_OD", [286, 489, 38, 18], DECIMAL),
    ("Pachy_Min_Pachmetry_OS", [326, 488, 38, 18], DECIMAL),
    ("Pachy_Y_Pachmetry_OD", [426, 488, 38, 18], SIGNED),
    ("Pachy_Y_Pachmetry_OS", [466, 488, 38, 18], SIGNED),
    ("Pachy_MinMedian_Pachmetry_OD", [286, 515, 38, 18], SIGNED),
    ("Pachy_MinMedian_Pachmetry_OS", [326, 515, 38, 18], SIGNED),
    ("Pachy_MinMax_Pachmetry_OD", [427, 515, 38, 18], SIGNED),
    ("Pachy_MinMax_Pachmetry_OS", [466, 515, 38, 18], SIGNED),
    ("Net_Power_OS", [802, 490, 41, 18], DECIMAL),
    ("Anterior_Power_OS", [856, 488, 41, 18], DECIMAL),
    ("Posterior_Power_OS", [908, 491, 41, 18], SIGNED),
    ("Anterior_R_OS", [804, 533, 33, 18], DECIMAL),
    ("Posterior_R_OS", [902, 534, 33, 18], DECIMAL),
    ("Epi_Superior_Epithelium_OD", [563, 461, 38, 18], DECIMAL),
    ("Epi_Superior_Epithelium_OS", [596, 460, 38, 18], DECIMAL),
    ("Epi_Inferior_Epithelium_OD", [677, 461, 38, 18], DECIMAL),
    ("Epi_Inferior_Epithelium_OS", [710, 461, 38, 18], DECIMAL),
    ("Epi_Min_Epithelium_OD", [563, 487, 38, 18], DECIMAL),
    ("Epi_Min_Epithelium_OS", [596, 487, 38, 18], DECIMAL),
    ("Epi_Max_Epithelium_OD", [678, 487, 38, 18], DECIMAL),
    ("Epi_Max_Epithelium_OS", [710, 487, 38, 18], DECIMAL),
    ("Epi_StdDev_Epithelium_OD", [564, 513, 38, 18], DECIMAL),
    ("Epi_StdDev_Epithelium_OS", [596, 513, 38, 18], DECIMAL),
    ("Epi_MinMax_Epithelium_OD", [677, 515, 30, 18], SIGNED),
    ("Epi_MinMax_Epithelium_OS", [711, 516, 30, 18], SIGNED),
];

const EXAM_TWO: &[Row] = &[
    ("SSI", [491, 52, 60, 16], DECIMAL),
    ("Net_Power", [76, 386, 41, 18], DECIMAL),
    ("Anterior_Power", [134, 385, 41, 18], DECIMAL),
    ("Posterior_Power", [191, 387, 41, 18], SIGNED),
    ("Anterior_R", [83, 474, 33, 18], DECIMAL),
    ("Posterior_R", [196, 472, 33, 18], DECIMAL),
    ("Pachy_SNIT", [100, 570, 38, 18], SIGNED),
    ("Pachy_SI", [212, 570, 38, 18], SIGNED),
    ("Pachy_Min", [100, 598, 38, 18], DECIMAL),
    ("Pachy_Y", [210, 598, 38, 18], SIGNED),
    ("Pachy_MinMedian", [99, 624, 38, 18], SIGNED),
    ("Pachy_MinMax", [210, 626, 38, 18], SIGNED),
    ("Epi_Superior", [98, 730, 38, 18], DECIMAL),
    ("Epi_Inferior", [210, 730, 38, 18], DECIMAL),
    ("Epi_Min", [99, 758, 38, 18], DECIMAL),
    ("Epi_Max", [212, 757, 38, 18], DECIMAL),
    ("Epi_StdDev", [99, 785, 38, 18], DECIMAL),
    ("Epi_MinMax", [210, 784, 30, 18], SIGNED),
];

fn to_specs(rows: &[Row]) -> Vec<FieldSpec> {
    rows.iter()
        .map(|&(name, rect, chars)| FieldSpec::new(name, rect, chars))
        .collect()
}

pub(super) fn info_specs(id: TemplateId) -> Vec<FieldSpec> {
    match id {
        TemplateId::One => to_specs(INFO_ONE),
        TemplateId::Two => to_specs(INFO_TWO),
    }
}

pub(super) fn exam_specs(id: TemplateId) -> Vec<FieldSpec> {
    match id {
        TemplateId::One => to_specs(EXAM_ONE),
        TemplateId::Two => to_specs(EXAM_TWO),
    }
}
