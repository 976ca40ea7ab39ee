//! Periodic table subset covering what turns up in screening libraries.

/// Static data for one element.
#[derive(Debug, PartialEq)]
pub struct ElementInfo {
    /// Atomic number
    pub number: u8,
    /// Element symbol with conventional capitalisation
    pub symbol: &'static str,
    /// Mass of the most abundant isotope in Da
    pub monoisotopic_mass: f64,
    /// Valence shell electron count for main group elements
    outer_electrons: Option<u8>,
    /// Whether the element may use its d orbitals (third period and below)
    expanded_octet: bool,
}

macro_rules! element {
    ($number:expr, $symbol:expr, $mass:expr, $outer:expr, $expanded:expr) => {
        ElementInfo {
            number: $number,
            symbol: $symbol,
            monoisotopic_mass: $mass,
            outer_electrons: $outer,
            expanded_octet: $expanded,
        }
    };
}

static ELEMENTS: &[ElementInfo] = &[
    element!(1, "H", 1.007_825_032_23, Some(1), false),
    element!(3, "Li", 7.016_003_436_6, Some(1), false),
    element!(5, "B", 11.009_305_36, Some(3), false),
    element!(6, "C", 12.0, Some(4), false),
    element!(7, "N", 14.003_074_004_43, Some(5), false),
    element!(8, "O", 15.994_914_619_57, Some(6), false),
    element!(9, "F", 18.998_403_162_73, Some(7), false),
    element!(11, "Na", 22.989_769_282, Some(1), false),
    element!(12, "Mg", 23.985_041_697, Some(2), false),
    element!(13, "Al", 26.981_538_53, Some(3), false),
    element!(14, "Si", 27.976_926_534_65, Some(4), true),
    element!(15, "P", 30.973_761_998_42, Some(5), true),
    element!(16, "S", 31.972_071_174_4, Some(6), true),
    element!(17, "Cl", 34.968_852_682, Some(7), true),
    element!(19, "K", 38.963_706_486_4, Some(1), false),
    element!(20, "Ca", 39.962_590_863, Some(2), false),
    element!(25, "Mn", 54.938_043_91, None, false),
    element!(26, "Fe", 55.934_936_33, None, false),
    element!(27, "Co", 58.933_194_29, None, false),
    element!(28, "Ni", 57.935_342_41, None, false),
    element!(29, "Cu", 62.929_597_72, None, false),
    element!(30, "Zn", 63.929_142_01, None, false),
    element!(32, "Ge", 73.921_177_761, Some(4), true),
    element!(33, "As", 74.921_594_57, Some(5), true),
    element!(34, "Se", 79.916_521_8, Some(6), true),
    element!(35, "Br", 78.918_337_6, Some(7), true),
    element!(50, "Sn", 119.902_201_63, Some(4), true),
    element!(52, "Te", 129.906_222_748, Some(6), true),
    element!(53, "I", 126.904_471_9, Some(7), true),
    element!(78, "Pt", 194.964_791_7, None, false),
];

/// Look up an element by its symbol, e.g. `"Cl"`.
pub fn element_by_symbol(symbol: &str) -> Option<&'static ElementInfo> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by atomic number.
pub fn element_by_number(number: u8) -> Option<&'static ElementInfo> {
    ELEMENTS.iter().find(|e| e.number == number)
}

impl ElementInfo {
    /// Valences this element can take at the given formal charge, smallest first.
    ///
    /// Charged atoms take the valences of the isoelectronic neutral atom,
    /// so N+ behaves as C and O- behaves as F. Transition metals return an
    /// empty list and never receive implicit hydrogens.
    pub fn allowed_valences(&self, charge: i8) -> &'static [u8] {
        let Some(outer) = self.outer_electrons else {
            return &[];
        };
        let effective = outer as i16 - charge as i16;
        match (effective, self.expanded_octet) {
            (0, _) => &[0],
            (1, _) => &[1],
            (2, _) => &[2],
            (3, _) => &[3],
            (4, _) => &[4],
            (5, false) => &[3],
            (5, true) => &[3, 5],
            (6, false) => &[2],
            (6, true) => &[2, 4, 6],
            (7, false) => &[1],
            (7, true) => &[1, 3, 5, 7],
            _ => &[],
        }
    }

    /// The smallest valence at the given charge, if the element has one.
    pub fn default_valence(&self, charge: i8) -> Option<u8> {
        self.allowed_valences(charge).first().copied()
    }
}
