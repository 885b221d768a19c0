use std::fmt;

/// One of the 46 validator kinds a rule descriptor's `tip_regula_id` selects.
///
/// The numbering is part of the wire contract with the reference service and
/// is therefore fixed; see `spec.md` §4.5 in the project root for the
/// per-kind behavior each variant dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum RuleKind {
    SubmissionPathExists = 1,
    ArchiveIsValid = 2,
    MainDirCount = 3,
    MainDirRegex = 4,
    FolderCount = 5,
    FolderNamesPresent = 6,
    FolderPathPrefix = 7,
    GeoPackageCount = 8,
    GeoPackageNameRegex = 9,
    NonArchivePdfCount = 10,
    PdfNamesPresent = 11,
    AvizeCount = 12,
    AvizeNameRegex = 13,
    PdfMagicNumber = 14,
    GeoPackageDriver = 15,
    LayerCountAtLeast = 16,
    LayerExists = 17,
    NonGeometryColumnCount = 18,
    ColumnsPresent = 19,
    LayerNonEmpty = 20,
    ColumnsNotNull = 21,
    ColumnDtypes = 22,
    ValueDomain = 23,
    TemporalCoherence = 24,
    HilucsHierarchy = 25,
    ReferentialInclusion = 26,
    LayerCrs = 27,
    GeometryColumnNonEmpty = 28,
    NoNullGeometries = 29,
    GeometryType = 30,
    GeometryValidity = 31,
    WithinAdminBoundary = 32,
    WithinContainer = 33,
    CoversContainer = 34,
    TrueOverlap = 35,
    SliverPolygons = 36,
    UniqueCodes = 37,
    ReferentialExclusion = 38,
    RomanianNormalization = 39,
    SingleUniqueValue = 40,
    GeometryIs2d = 41,
    AreaWithinTolerance = 42,
    LengthWithinTolerance = 43,
    ColumnSumsMatch = 44,
    AdminPolygonResolvable = 45,
    CrossTableComposite = 46,
}

/// A `tip_regula_id` outside the closed 1..46 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized rule kind id: {0}")]
pub struct UnknownRuleKind(pub u32);

impl RuleKind {
    pub const ALL: [RuleKind; 46] = [
        RuleKind::SubmissionPathExists,
        RuleKind::ArchiveIsValid,
        RuleKind::MainDirCount,
        RuleKind::MainDirRegex,
        RuleKind::FolderCount,
        RuleKind::FolderNamesPresent,
        RuleKind::FolderPathPrefix,
        RuleKind::GeoPackageCount,
        RuleKind::GeoPackageNameRegex,
        RuleKind::NonArchivePdfCount,
        RuleKind::PdfNamesPresent,
        RuleKind::AvizeCount,
        RuleKind::AvizeNameRegex,
        RuleKind::PdfMagicNumber,
        RuleKind::GeoPackageDriver,
        RuleKind::LayerCountAtLeast,
        RuleKind::LayerExists,
        RuleKind::NonGeometryColumnCount,
        RuleKind::ColumnsPresent,
        RuleKind::LayerNonEmpty,
        RuleKind::ColumnsNotNull,
        RuleKind::ColumnDtypes,
        RuleKind::ValueDomain,
        RuleKind::TemporalCoherence,
        RuleKind::HilucsHierarchy,
        RuleKind::ReferentialInclusion,
        RuleKind::LayerCrs,
        RuleKind::GeometryColumnNonEmpty,
        RuleKind::NoNullGeometries,
        RuleKind::GeometryType,
        RuleKind::GeometryValidity,
        RuleKind::WithinAdminBoundary,
        RuleKind::WithinContainer,
        RuleKind::CoversContainer,
        RuleKind::TrueOverlap,
        RuleKind::SliverPolygons,
        RuleKind::UniqueCodes,
        RuleKind::ReferentialExclusion,
        RuleKind::RomanianNormalization,
        RuleKind::SingleUniqueValue,
        RuleKind::GeometryIs2d,
        RuleKind::AreaWithinTolerance,
        RuleKind::LengthWithinTolerance,
        RuleKind::ColumnSumsMatch,
        RuleKind::AdminPolygonResolvable,
        RuleKind::CrossTableComposite,
    ];

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for RuleKind {
    type Error = UnknownRuleKind;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        RuleKind::ALL
            .into_iter()
            .find(|k| k.as_u32() == id)
            .ok_or(UnknownRuleKind(id))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (R{})", self, self.as_u32())
    }
}
