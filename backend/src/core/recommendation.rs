// core/recommendation.rs
use crate::models::{Career, Catalog, Course, GovernmentExam, UserProfile};
use serde::{Deserialize, Serialize};

pub const MAX_COURSES: usize = 5;
pub const MAX_CAREERS: usize = 3;
pub const MAX_EXAMS: usize = 2;

/// Tranche d'âge retenue pour les concours, bornes incluses
pub const MIN_EXAM_AGE: u32 = 16;
pub const MAX_EXAM_AGE: u32 = 24;

/// Sélection bornée de cours, carrières et concours pour une filière
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub courses: Vec<Course>,
    pub careers: Vec<Career>,
    pub exams: Vec<GovernmentExam>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty() && self.careers.is_empty() && self.exams.is_empty()
    }
}

fn open_to(streams: &[String], stream: &str) -> bool {
    streams.iter().any(|s| s == stream)
}

/// Recommandations pour une filière : ordre du catalogue conservé,
/// au plus 5 cours, 3 carrières et 2 concours. Une filière vide ou
/// inconnue donne des listes vides.
pub fn recommend(catalog: &Catalog, stream: &str) -> Recommendations {
    Recommendations {
        courses: catalog
            .courses
            .iter()
            .filter(|c| open_to(&c.streams, stream))
            .take(MAX_COURSES)
            .cloned()
            .collect(),
        careers: catalog
            .careers
            .iter()
            .filter(|c| open_to(&c.streams, stream))
            .take(MAX_CAREERS)
            .cloned()
            .collect(),
        exams: catalog
            .exams
            .iter()
            .filter(|e| open_to(&e.streams, stream))
            .take(MAX_EXAMS)
            .cloned()
            .collect(),
    }
}

/// Exclut tous les concours quand l'âge est hors de [16, 24].
/// Sans âge connu, la liste est renvoyée telle quelle.
pub fn filter_exams_by_age(exams: &[GovernmentExam], age: Option<u32>) -> Vec<GovernmentExam> {
    match age {
        Some(age) if !(MIN_EXAM_AGE..=MAX_EXAM_AGE).contains(&age) => Vec::new(),
        _ => exams.to_vec(),
    }
}

/// Recommandations personnalisées à partir du profil.
///
/// Le filtre d'âge s'applique avant la troncature. Les carrières qui
/// partagent un centre d'intérêt avec l'élève passent en tête, l'ordre
/// du catalogue départageant le reste.
pub fn recommend_for_profile(catalog: &Catalog, profile: &UserProfile) -> Recommendations {
    let stream = match profile.stream {
        Some(stream) => stream.as_str(),
        None => return Recommendations::default(),
    };

    let courses = catalog
        .courses
        .iter()
        .filter(|c| open_to(&c.streams, stream))
        .take(MAX_COURSES)
        .cloned()
        .collect();

    let mut careers: Vec<&Career> = catalog
        .careers
        .iter()
        .filter(|c| open_to(&c.streams, stream))
        .collect();
    careers.sort_by_key(|career| !shares_interest(career, &profile.interests));
    let careers = careers.into_iter().take(MAX_CAREERS).cloned().collect();

    let stream_exams: Vec<GovernmentExam> = catalog
        .exams
        .iter()
        .filter(|e| open_to(&e.streams, stream))
        .cloned()
        .collect();
    let mut exams = filter_exams_by_age(&stream_exams, profile.age);
    exams.truncate(MAX_EXAMS);

    Recommendations { courses, careers, exams }
}

fn shares_interest(career: &Career, interests: &[String]) -> bool {
    career
        .interests
        .iter()
        .any(|ci| interests.iter().any(|i| i.eq_ignore_ascii_case(ci)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProfile, Stream};
    use uuid::Uuid;

    fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|item| id(item).to_string()).collect()
    }

    fn profile(stream: Option<Stream>, interests: &[&str], age: Option<u32>) -> UserProfile {
        let mut profile = UserProfile::new(
            Uuid::new_v4(),
            NewProfile {
                full_name: "Rohan Iyer".to_string(),
                email: "rohan@example.in".to_string(),
                mobile: None,
                grade: Some(11),
            },
        );
        profile.stream = stream;
        profile.interests = interests.iter().map(|s| s.to_string()).collect();
        profile.age = age;
        profile
    }

    #[test]
    fn test_every_result_matches_stream() {
        let catalog = Catalog::seed().unwrap();
        for stream in ["Science", "Commerce", "Arts"] {
            let recs = recommend(&catalog, stream);
            assert!(!recs.courses.is_empty(), "{stream}");
            assert!(recs.courses.iter().all(|c| c.streams.iter().any(|s| s == stream)));
            assert!(recs.careers.iter().all(|c| c.streams.iter().any(|s| s == stream)));
            assert!(recs.exams.iter().all(|e| e.streams.iter().any(|s| s == stream)));
        }
    }

    #[test]
    fn test_bounds_and_order() {
        let catalog = Catalog::seed().unwrap();
        let recs = recommend(&catalog, "Science");

        assert_eq!(recs.courses.len(), MAX_COURSES);
        assert_eq!(recs.careers.len(), MAX_CAREERS);
        assert_eq!(recs.exams.len(), MAX_EXAMS);
        assert_eq!(ids(&recs.courses, |c| c.id.as_str()), vec!["btech", "mbbs", "bsc", "bpharm", "bca"]);
        assert_eq!(ids(&recs.careers, |c| c.id.as_str()), vec!["software-engineer", "doctor", "data-scientist"]);
        assert_eq!(ids(&recs.exams, |e| e.id.as_str()), vec!["jee-main", "neet-ug"]);
    }

    #[test]
    fn test_unknown_or_empty_stream_gives_empty_result() {
        let catalog = Catalog::seed().unwrap();
        assert!(recommend(&catalog, "Vocational").is_empty());
        assert!(recommend(&catalog, "").is_empty());
        assert!(recommend(&Catalog::default(), "Science").is_empty());
    }

    #[test]
    fn test_age_filter() {
        let catalog = Catalog::seed().unwrap();
        let exams = &catalog.exams;

        assert_eq!(filter_exams_by_age(exams, None).len(), exams.len());
        assert_eq!(filter_exams_by_age(exams, Some(20)).len(), exams.len());
        assert_eq!(filter_exams_by_age(exams, Some(16)).len(), exams.len());
        assert_eq!(filter_exams_by_age(exams, Some(24)).len(), exams.len());
        assert!(filter_exams_by_age(exams, Some(25)).is_empty());
        assert!(filter_exams_by_age(exams, Some(15)).is_empty());
    }

    #[test]
    fn test_profile_without_stream() {
        let catalog = Catalog::seed().unwrap();
        assert!(recommend_for_profile(&catalog, &profile(None, &[], Some(16))).is_empty());
    }

    #[test]
    fn test_profile_interests_rank_careers_first() {
        let catalog = Catalog::seed().unwrap();
        let recs = recommend_for_profile(&catalog, &profile(Some(Stream::Science), &["law"], Some(17)));

        assert_eq!(recs.careers[0].id, "lawyer");
        assert_eq!(recs.careers.len(), MAX_CAREERS);
        assert_eq!(recs.exams.len(), MAX_EXAMS);
    }

    #[test]
    fn test_profile_age_outside_window_drops_exams() {
        let catalog = Catalog::seed().unwrap();
        let recs = recommend_for_profile(&catalog, &profile(Some(Stream::Commerce), &[], Some(25)));
        assert!(recs.exams.is_empty());
        assert!(!recs.courses.is_empty());
    }
}
