//! Class roster model
//!
//! The roster is shared read-only context: it supplies expected identities
//! for name verification and the name variants the roster detector redacts.

use super::ids::StudentId;
use serde::{Deserialize, Serialize};

/// A single student in a class roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Roster-issued student identifier
    pub student_id: StudentId,

    /// Legal first name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Preferred first name, if different
    #[serde(default)]
    pub preferred_name: Option<String>,
}

impl RosterEntry {
    /// Creates a roster entry without a preferred name
    pub fn new(
        student_id: StudentId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            student_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            preferred_name: None,
        }
    }

    /// Sets the preferred name
    pub fn with_preferred_name(mut self, preferred: impl Into<String>) -> Self {
        self.preferred_name = Some(preferred.into());
        self
    }

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "Preferred Last" when a preferred name exists, otherwise the full name
    pub fn display_name(&self) -> String {
        match &self.preferred_name {
            Some(preferred) => format!("{} {}", preferred, self.last_name),
            None => self.full_name(),
        }
    }

    /// Every way this student's name is expected to appear in a comment
    pub fn all_name_variants(&self) -> Vec<String> {
        let mut variants = vec![
            self.full_name(),
            self.first_name.clone(),
            self.last_name.clone(),
            format!("{}, {}", self.last_name, self.first_name),
        ];
        if let Some(preferred) = &self.preferred_name {
            variants.push(preferred.clone());
            variants.push(format!("{} {}", preferred, self.last_name));
        }
        variants
    }

    /// Known variants other than the full name, for use as match variants
    pub fn known_variants(&self) -> Vec<String> {
        let full = self.full_name();
        self.all_name_variants()
            .into_iter()
            .filter(|v| *v != full)
            .collect()
    }
}

/// Complete roster for a class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassRoster {
    /// Class identifier
    #[serde(default)]
    pub class_id: String,

    /// Display name of the class
    #[serde(default)]
    pub class_name: String,

    /// Enrolled students
    #[serde(default)]
    pub students: Vec<RosterEntry>,
}

impl ClassRoster {
    /// Creates a roster from a list of students
    pub fn new(class_id: impl Into<String>, students: Vec<RosterEntry>) -> Self {
        Self {
            class_id: class_id.into(),
            class_name: String::new(),
            students,
        }
    }

    /// All name variants across the roster
    pub fn all_name_variants(&self) -> Vec<String> {
        self.students
            .iter()
            .flat_map(RosterEntry::all_name_variants)
            .collect()
    }

    /// Finds a student by any exact (case-insensitive) name variant
    pub fn find_student(&self, name: &str) -> Option<&RosterEntry> {
        let needle = name.trim().to_lowercase();
        self.students.iter().find(|student| {
            student
                .all_name_variants()
                .iter()
                .any(|v| v.to_lowercase() == needle)
        })
    }

    /// Finds a student by id
    pub fn find_by_id(&self, id: &StudentId) -> Option<&RosterEntry> {
        self.students.iter().find(|s| &s.student_id == id)
    }

    /// Number of students
    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// Whether the roster has no students
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> RosterEntry {
        RosterEntry::new(StudentId::new("S1001").unwrap(), "William", "Turner")
            .with_preferred_name("Will")
    }

    #[test]
    fn test_name_variants() {
        let variants = entry().all_name_variants();
        assert_eq!(
            variants,
            vec![
                "William Turner",
                "William",
                "Turner",
                "Turner, William",
                "Will",
                "Will Turner"
            ]
        );
    }

    #[test]
    fn test_display_name_prefers_preferred() {
        assert_eq!(entry().display_name(), "Will Turner");
        let plain = RosterEntry::new(StudentId::new("S1").unwrap(), "Ana", "Lopez");
        assert_eq!(plain.display_name(), "Ana Lopez");
    }

    #[test]
    fn test_known_variants_excludes_full_name() {
        let variants = entry().known_variants();
        assert!(!variants.contains(&"William Turner".to_string()));
        assert!(variants.contains(&"Will Turner".to_string()));
    }

    #[test]
    fn test_find_student_case_insensitive() {
        let roster = ClassRoster::new("class-1", vec![entry()]);
        assert!(roster.find_student("turner, william").is_some());
        assert!(roster.find_student("  WILL  ").is_some());
        assert!(roster.find_student("Bill").is_none());
    }
}
