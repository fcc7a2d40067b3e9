//! Language features and feature sets
//!
//! Every construct of the language maps to a [`LanguageFeature`]. Mandatory
//! features are always accepted; optional ones (the registry below, plus
//! declared user-defined functions) must be enabled in the [`FeatureSet`]
//! handed to the parser.

use crate::{AdqlVersion, Ast, FunctionDef, GeometryFunction, NodeId, NodeKind, SetOperator};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const TYPE_ADQL_GEO: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-geo";
pub const TYPE_ADQL_STRING: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-string";
pub const TYPE_ADQL_SETS: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-sets";
pub const TYPE_ADQL_COMMON_TABLE: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-common-table";
pub const TYPE_ADQL_TYPE: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-type";
pub const TYPE_ADQL_UNIT: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-unit";
pub const TYPE_ADQL_OFFSET: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-offset";
pub const TYPE_ADQL_CONDITIONAL: &str = "ivo://ivoa.net/std/TAPRegExt#features-adql-conditional";
pub const TYPE_UDF: &str = "ivo://ivoa.net/std/TAPRegExt#features-udf";

/// One construct of the language.
///
/// Two features are the same feature when their type and form are equal;
/// the other fields are informative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageFeature {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<Cow<'static, str>>,
    pub form: Cow<'static, str>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Cow<'static, str>>,
    /// Version that introduced the construct
    pub since: AdqlVersion,
}

impl LanguageFeature {
    pub const fn optional(
        feature_type: &'static str,
        form: &'static str,
        since: AdqlVersion,
        description: &'static str,
    ) -> Self {
        Self {
            feature_type: Some(Cow::Borrowed(feature_type)),
            form: Cow::Borrowed(form),
            optional: true,
            description: Some(Cow::Borrowed(description)),
            since,
        }
    }

    /// A construct every parser must accept
    pub const fn mandatory(form: &'static str) -> Self {
        Self {
            feature_type: None,
            form: Cow::Borrowed(form),
            optional: false,
            description: None,
            since: AdqlVersion::V2_0,
        }
    }

    /// Feature of a call to an undeclared user-defined function
    pub fn udf(form: impl Into<String>) -> Self {
        Self {
            feature_type: Some(Cow::Borrowed(TYPE_UDF)),
            form: Cow::Owned(form.into()),
            optional: true,
            description: None,
            since: AdqlVersion::V2_0,
        }
    }

    pub fn is_udf(&self) -> bool {
        self.feature_type.as_deref() == Some(TYPE_UDF)
    }

    /// Registered optional feature with this identity
    pub fn find(feature_type: &str, form: &str) -> Option<&'static LanguageFeature> {
        REGISTRY
            .iter()
            .copied()
            .find(|f| f.feature_type.as_deref() == Some(feature_type) && f.form == form)
    }

    /// Registered optional feature with this form, whatever its type
    pub fn find_form(form: &str) -> Option<&'static LanguageFeature> {
        REGISTRY.iter().copied().find(|f| f.form.eq_ignore_ascii_case(form))
    }

    /// Registered optional features available in `version`
    pub fn registry(version: AdqlVersion) -> impl Iterator<Item = &'static LanguageFeature> {
        REGISTRY.iter().copied().filter(move |f| f.since <= version)
    }
}

impl PartialEq for LanguageFeature {
    fn eq(&self, other: &Self) -> bool {
        self.feature_type == other.feature_type && self.form == other.form
    }
}

impl Eq for LanguageFeature {}

impl Hash for LanguageFeature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.feature_type.hash(state);
        self.form.hash(state);
    }
}

impl fmt::Display for LanguageFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.feature_type {
            Some(ty) => write!(f, "{} ({ty})", self.form),
            None => f.write_str(&self.form),
        }
    }
}

macro_rules! features {
    ($($name:ident = ($ty:expr, $form:literal, $since:ident, $desc:literal);)+) => {
        $(pub static $name: LanguageFeature =
            LanguageFeature::optional($ty, $form, AdqlVersion::$since, $desc);)+

        /// Every optional feature, in registration order
        pub static REGISTRY: &[&LanguageFeature] = &[$(&$name),+];
    };
}

features! {
    AREA = (TYPE_ADQL_GEO, "AREA", V2_0, "Area of a region, in square degrees");
    BOX = (TYPE_ADQL_GEO, "BOX", V2_0, "Box region");
    CENTROID = (TYPE_ADQL_GEO, "CENTROID", V2_0, "Centroid of a region");
    CIRCLE = (TYPE_ADQL_GEO, "CIRCLE", V2_0, "Circle region");
    CONTAINS = (TYPE_ADQL_GEO, "CONTAINS", V2_0, "Containment test between two regions");
    COORD1 = (TYPE_ADQL_GEO, "COORD1", V2_0, "First coordinate of a point");
    COORD2 = (TYPE_ADQL_GEO, "COORD2", V2_0, "Second coordinate of a point");
    COORDSYS = (TYPE_ADQL_GEO, "COORDSYS", V2_0, "Coordinate system of a geometry");
    DISTANCE = (TYPE_ADQL_GEO, "DISTANCE", V2_0, "Angular distance between two points");
    INTERSECTS = (TYPE_ADQL_GEO, "INTERSECTS", V2_0, "Overlap test between two regions");
    POINT = (TYPE_ADQL_GEO, "POINT", V2_0, "Point on the sky");
    POLYGON = (TYPE_ADQL_GEO, "POLYGON", V2_0, "Polygon region");
    REGION = (TYPE_ADQL_GEO, "REGION", V2_0, "Region from an STC-S string");
    LOWER = (TYPE_ADQL_STRING, "LOWER", V2_1, "Lower case conversion");
    UPPER = (TYPE_ADQL_STRING, "UPPER", V2_1, "Upper case conversion");
    ILIKE = (TYPE_ADQL_STRING, "ILIKE", V2_1, "Case-insensitive pattern matching");
    UNION = (TYPE_ADQL_SETS, "UNION", V2_1, "Union of the rows of two queries");
    EXCEPT = (TYPE_ADQL_SETS, "EXCEPT", V2_1, "Rows of a query absent from another");
    INTERSECT = (TYPE_ADQL_SETS, "INTERSECT", V2_1, "Rows common to two queries");
    WITH = (TYPE_ADQL_COMMON_TABLE, "WITH", V2_1, "Common table expressions");
    CAST = (TYPE_ADQL_TYPE, "CAST", V2_1, "Type conversion");
    IN_UNIT = (TYPE_ADQL_UNIT, "IN_UNIT", V2_1, "Unit conversion");
    OFFSET = (TYPE_ADQL_OFFSET, "OFFSET", V2_1, "Skip the first rows of the result");
    COALESCE = (TYPE_ADQL_CONDITIONAL, "COALESCE", V2_1, "First non-null argument");
}

impl GeometryFunction {
    pub fn feature(&self) -> &'static LanguageFeature {
        match self {
            GeometryFunction::Area => &AREA,
            GeometryFunction::Box => &BOX,
            GeometryFunction::Centroid => &CENTROID,
            GeometryFunction::Circle => &CIRCLE,
            GeometryFunction::Contains => &CONTAINS,
            GeometryFunction::Coord1 => &COORD1,
            GeometryFunction::Coord2 => &COORD2,
            GeometryFunction::CoordSys => &COORDSYS,
            GeometryFunction::Distance => &DISTANCE,
            GeometryFunction::Intersects => &INTERSECTS,
            GeometryFunction::Point => &POINT,
            GeometryFunction::Polygon => &POLYGON,
            GeometryFunction::Region => &REGION,
        }
    }
}

impl SetOperator {
    pub fn feature(&self) -> &'static LanguageFeature {
        match self {
            SetOperator::Union => &UNION,
            SetOperator::Except => &EXCEPT,
            SetOperator::Intersect => &INTERSECT,
        }
    }
}

impl Ast {
    /// The feature a node corresponds to
    pub fn feature(&self, id: NodeId) -> LanguageFeature {
        match self.kind(id) {
            NodeKind::Geometry(g) => g.function.feature().clone(),
            NodeKind::StringFunction(f) => match f {
                crate::StringFunction::Lower => LOWER.clone(),
                crate::StringFunction::Upper => UPPER.clone(),
            },
            NodeKind::Like {
                case_insensitive: true,
                ..
            } => ILIKE.clone(),
            NodeKind::SetOperation(op) => op.op.feature().clone(),
            NodeKind::With => WITH.clone(),
            NodeKind::Cast(_) => CAST.clone(),
            NodeKind::InUnit => IN_UNIT.clone(),
            NodeKind::Coalesce => COALESCE.clone(),
            NodeKind::UserFunction(udf) => match &udf.definition {
                Some(def) => def.feature(),
                None => LanguageFeature::udf(format!("{}(...)", udf.name)),
            },
            other => LanguageFeature::mandatory(other.name()),
        }
    }

    /// Every feature a single node uses: its own and, for queries, OFFSET.
    /// An empty WITH list uses nothing.
    pub fn features_of(&self, id: NodeId) -> Vec<LanguageFeature> {
        let kind = self.kind(id);
        if matches!(kind, NodeKind::With) && self.children(id).is_empty() {
            return Vec::new();
        }
        let mut features = vec![self.feature(id)];
        let offset = match kind {
            NodeKind::Select(q) => q.offset,
            NodeKind::SetOperation(s) => s.offset,
            _ => None,
        };
        if offset.is_some() {
            features.push(OFFSET.clone());
        }
        features
    }
}

/// Features accepted by a parser.
///
/// Mandatory features are always supported. Optional ones are supported
/// only once enabled; declared user-defined functions are recorded with
/// their definition so calls can be typed. Calls to undeclared functions
/// are accepted only when [`FeatureSet::allows_any_udf`] is set.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    features: IndexMap<LanguageFeature, bool>,
    udfs: IndexMap<String, FunctionDef>,
    any_udf: bool,
}

impl FeatureSet {
    /// A set supporting no optional feature and no user-defined function
    pub fn new() -> Self {
        Self::default()
    }

    /// Default set for a grammar version: every optional feature of the
    /// version and any user-defined function
    pub fn for_version(version: AdqlVersion) -> Self {
        let mut set = Self::new();
        set.support_all(version);
        set.allow_any_udf(true);
        set
    }

    /// Enable an optional feature. Returns `false` for mandatory features.
    pub fn support(&mut self, feature: &LanguageFeature) -> bool {
        if !feature.optional {
            return false;
        }
        self.features.insert(feature.clone(), true);
        true
    }

    /// Disable an optional feature.
    ///
    /// Returns `false` when the feature is mandatory or unknown to both the
    /// registry and this set.
    pub fn unsupport(&mut self, feature: &LanguageFeature) -> bool {
        if !feature.optional {
            return false;
        }
        if let Some(enabled) = self.features.get_mut(feature) {
            *enabled = false;
            if feature.is_udf() {
                self.udfs.shift_remove(feature.form.as_ref());
            }
            return true;
        }
        if REGISTRY.iter().any(|f| *f == feature) {
            self.features.insert(feature.clone(), false);
            return true;
        }
        false
    }

    pub fn is_supporting(&self, feature: &LanguageFeature) -> bool {
        !feature.optional || self.features.get(feature).copied().unwrap_or(false)
    }

    /// Enable every registered optional feature of `version`
    pub fn support_all(&mut self, version: AdqlVersion) {
        for feature in LanguageFeature::registry(version) {
            self.support(feature);
        }
    }

    /// Disable every optional feature, declared functions included
    pub fn unsupport_all(&mut self) {
        for enabled in self.features.values_mut() {
            *enabled = false;
        }
        self.udfs.clear();
    }

    pub fn allow_any_udf(&mut self, allow: bool) {
        self.any_udf = allow;
    }

    pub fn allows_any_udf(&self) -> bool {
        self.any_udf
    }

    /// Declare a user-defined function
    pub fn support_udf(&mut self, definition: FunctionDef) -> bool {
        let feature = definition.feature();
        self.udfs.insert(feature.form.to_string(), definition);
        self.support(&feature)
    }

    /// Declared function matching a call
    pub fn find_udf(&self, name: &str, arity: usize) -> Option<&FunctionDef> {
        self.udfs.values().find(|def| def.matches_call(name, arity))
    }

    pub fn udfs(&self) -> impl Iterator<Item = &FunctionDef> {
        self.udfs.values()
    }

    /// Enabled optional features, in the order they were enabled
    pub fn supported(&self) -> Vec<&LanguageFeature> {
        self.features
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(feature, _)| feature)
            .collect()
    }

    /// Registered or recorded optional features that are not enabled
    pub fn unsupported(&self) -> Vec<&LanguageFeature> {
        let recorded = self
            .features
            .iter()
            .filter(|(_, enabled)| !**enabled)
            .map(|(feature, _)| feature);
        let unregistered = REGISTRY
            .iter()
            .copied()
            .filter(|f| !self.features.contains_key(*f));
        recorded.chain(unregistered).collect()
    }
}
