//! Thickness-map sample geometry.
//!
//! Each map quadrant (pachymetry or epithelium, per eye) holds 17 sample
//! points: the optical centre plus an inner and outer point for each of the
//! eight angular sectors. Field names are built from the quadrant code, the
//! sector and the ring, so the same sector list drives every layout.

use super::{DIGITS, FieldSpec, TemplateId};

/// Angular sectors, clockwise from superior.
pub const SECTORS: [&str; 8] = ["S", "ST", "T", "IT", "I", "IN", "N", "SN"];

/// Sample rings within each sector (inner, outer).
pub const RINGS: [u8; 2] = [1, 2];

/// Width of a sample box.
pub const SAMPLE_WIDTH: u32 = 45;

/// Height of a sample box.
pub const SAMPLE_HEIGHT: u32 = 15;

type Point = (u32, u32);

/// Sample-point table of one thickness map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quadrant {
    /// Short code used in field names, e.g. `POD` for pachymetry OD.
    pub code: &'static str,
    /// Optical-centre sample.
    pub center: Point,
    /// Inner and outer samples, indexed like [`SECTORS`].
    pub sectors: [[Point; 2]; 8],
}

impl Quadrant {
    /// Field name of the optical-centre sample.
    pub fn center_name(&self) -> String {
        format!("CO_{}", self.code)
    }

    /// Field specs of the sector samples, in sector then ring order.
    pub fn sector_specs(&self) -> impl Iterator<Item = FieldSpec> + '_ {
        SECTORS
            .into_iter()
            .zip(self.sectors.iter())
            .flat_map(move |(sector, rings)| {
                RINGS.into_iter().zip(rings.iter()).map(move |(ring, &point)| {
                    sample_spec(format!("{}_{}{}", self.code, sector, ring), point)
                })
            })
    }
}

const PACHYMETRY_OD_ONE: Quadrant = Quadrant {
    code: "POD",
    center: (270, 230),
    sectors: [
        [(268, 146), (268, 98)],
        [(210, 171), (176, 138)],
        [(184, 230), (141, 230)],
        [(211, 290), (173, 324)],
        [(270, 314), (269, 362)],
        [(328, 289), (364, 325)],
        [(354, 230), (403, 231)],
        [(328, 172), (362, 134)],
    ],
};

// Centre row is shared with the OD pachymetry map on this layout.
const PACHYMETRY_OS_ONE: Quadrant = Quadrant {
    code: "POS",
    center: (650, 230),
    sectors: [
        [(650, 147), (651, 98)],
        [(711, 171), (744, 136)],
        [(732, 230), (787, 232)],
        [(710, 291), (745, 325)],
        [(656, 319), (652, 363)],
        [(591, 289), (558, 323)],
        [(567, 230), (520, 232)],
        [(592, 170), (559, 138)],
    ],
};

const EPITHELIUM_OD_ONE: Quadrant = Quadrant {
    code: "EOD",
    center: (275, 741),
    sectors: [
        [(272, 656), (271, 610)],
        [(214, 680), (182, 648)],
        [(189, 742), (140, 741)],
        [(214, 800), (178, 835)],
        [(272, 822), (273, 873)],
        [(332, 800), (368, 835)],
        [(356, 740), (405, 741)],
        [(331, 681), (366, 646)],
    ],
};

const EPITHELIUM_OS_ONE: Quadrant = Quadrant {
    code: "EOS",
    center: (656, 742),
    sectors: [
        [(654, 654), (655, 610)],
        [(715, 681), (748, 648)],
        [(740, 740), (788, 741)],
        [(715, 800), (748, 834)],
        [(655, 825), (654, 874)],
        [(594, 800), (560, 834)],
        [(572, 742), (524, 744)],
        [(596, 681), (564, 649)],
    ],
};

const PACHYMETRY_OS_TWO: Quadrant = Quadrant {
    code: "POS",
    center: (450, 612),
    sectors: [
        [(451, 538), (451, 496)],
        [(504, 558), (531, 532)],
        [(528, 612), (571, 612)],
        [(508, 664), (538, 696)],
        [(456, 685), (454, 727)],
        [(403, 664), (374, 694)],
        [(379, 612), (339, 611)],
        [(404, 558), (375, 534)],
    ],
};

const EPITHELIUM_OS_TWO: Quadrant = Quadrant {
    code: "EOS",
    center: (738, 610),
    sectors: [
        [(736, 537), (734, 499)],
        [(788, 560), (821, 530)],
        [(812, 613), (854, 612)],
        [(790, 664), (822, 695)],
        [(738, 686), (740, 728)],
        [(684, 661), (658, 693)],
        [(663, 612), (625, 611)],
        [(687, 558), (660, 532)],
    ],
};

static QUADRANTS_ONE: [Quadrant; 4] = [
    PACHYMETRY_OD_ONE,
    PACHYMETRY_OS_ONE,
    EPITHELIUM_OD_ONE,
    EPITHELIUM_OS_ONE,
];

static QUADRANTS_TWO: [Quadrant; 2] = [PACHYMETRY_OS_TWO, EPITHELIUM_OS_TWO];

/// Quadrant tables of a layout.
pub fn quadrants(id: TemplateId) -> &'static [Quadrant] {
    match id {
        TemplateId::One => &QUADRANTS_ONE,
        TemplateId::Two => &QUADRANTS_TWO,
    }
}

fn sample_spec(name: String, (x, y): Point) -> FieldSpec {
    FieldSpec::new(name, [x, y, SAMPLE_WIDTH, SAMPLE_HEIGHT], DIGITS)
}

/// All map samples of a layout: every centre first, then each quadrant's sectors.
pub(super) fn map_specs(id: TemplateId) -> Vec<FieldSpec> {
    let quadrants = quadrants(id);
    let centers = quadrants
        .iter()
        .map(|q| sample_spec(q.center_name(), q.center));
    let sectors = quadrants.iter().flat_map(|q| q.sector_specs());
    centers.chain(sectors).collect()
}

pub(super) fn probe_spec() -> FieldSpec {
    sample_spec("probe".to_string(), PACHYMETRY_OD_ONE.center)
}
