use crate::common::xml::escape_attr;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
/// Relationship tables for OPC packages.
///
/// Every part (and the package itself) owns a table mapping relationship
/// ids to targets. Releasing an id here is what detaches a part from the
/// graph; the writer only serializes parts that stay reachable.
use std::collections::HashMap;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    /// Relative part reference or external URL
    target_ref: String,
    /// Directory of the source part, for resolving `target_ref`
    base_uri: String,
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Absolute partname of an internal target.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: HashMap::new(),
        }
    }

    /// Insert a relationship under an explicit id, replacing any previous
    /// entry with that id.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) -> &Relationship {
        let rel = Relationship::new(
            r_id.clone(),
            reltype,
            target_ref,
            self.base_uri.clone(),
            is_external,
        );
        self.rels.entry(r_id).insert_entry(rel).into_mut()
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Id of an internal relationship of `reltype` to `target_ref`, created
    /// with the lowest free id when missing.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> String {
        self.get_or_add_inner(reltype, target_ref, false)
    }

    /// External counterpart of [`get_or_add`](Self::get_or_add).
    pub fn get_or_add_ext_rel(&mut self, reltype: &str, target_ref: &str) -> String {
        self.get_or_add_inner(reltype, target_ref, true)
    }

    fn get_or_add_inner(&mut self, reltype: &str, target_ref: &str, external: bool) -> String {
        let existing = self.rels.values().find(|rel| {
            rel.reltype == reltype && rel.target_ref == target_ref && rel.is_external == external
        });
        if let Some(rel) = existing {
            return rel.r_id.clone();
        }
        let r_id = self.next_r_id();
        self.add_relationship(
            reltype.to_string(),
            target_ref.to_string(),
            r_id.clone(),
            external,
        );
        r_id
    }

    /// Lowest unused `rIdN`, filling gaps left by removed relationships.
    pub fn next_r_id(&self) -> String {
        let mut used: Vec<u32> = self
            .rels
            .keys()
            .filter_map(|r_id| Self::r_id_number(r_id))
            .collect();
        used.sort_unstable();

        let mut next = 1u32;
        for num in used {
            match num.cmp(&next) {
                std::cmp::Ordering::Equal => next += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {},
            }
        }
        format!("rId{}", next)
    }

    fn r_id_number(r_id: &str) -> Option<u32> {
        let digits = r_id.strip_prefix("rId")?;
        atoi_simd::parse::<u32>(digits.as_bytes()).ok()
    }

    /// The single relationship of a type.
    ///
    /// Fails when there is none or more than one.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.values().filter(|rel| rel.reltype == reltype);
        match (matching.next(), matching.next()) {
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "No relationship of type '{}'",
                reltype
            ))),
            (Some(rel), None) => Ok(rel),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    /// All relationships of a type, ordered by id.
    pub fn all_with_reltype(&self, reltype: &str) -> Vec<&Relationship> {
        let mut out: Vec<&Relationship> =
            self.rels.values().filter(|rel| rel.reltype == reltype).collect();
        out.sort_by_key(|rel| Self::sort_key(&rel.r_id));
        out
    }

    fn sort_key(r_id: &str) -> (u32, &str) {
        (Self::r_id_number(r_id).unwrap_or(u32::MAX), r_id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.remove(r_id)
    }

    /// Serialize as a `.rels` part, relationships ordered by numeric id.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by_key(|rel| Self::sort_key(&rel.r_id));

        for rel in rels {
            let target_mode = if rel.is_external {
                r#" TargetMode="External""#
            } else {
                ""
            };
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_attr(&rel.r_id),
                escape_attr(&rel.reltype),
                escape_attr(&rel.target_ref),
                target_mode
            ));
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}
