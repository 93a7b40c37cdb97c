//! User search.
//!
//! [`UserSearchService`] only knows the [`UserSearchRepo`] capability set. It
//! chains the optional filters of a [`SearchCriteria`] onto the full user
//! collection and hands back a [`LazyUsers`]; nothing reaches storage until
//! [`LazyUsers::fetch`] is awaited.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use abi::errors::Result;
use abi::types::{SearchCriteria, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// case-insensitive substring of first name, last name or email
    Text(String),
    Program(String),
    Term(i32),
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::Text(text) => {
                let text = text.to_lowercase();
                user.first_name.to_lowercase().contains(&text)
                    || user.last_name.to_lowercase().contains(&text)
                    || user.email.to_lowercase().contains(&text)
            }
            UserFilter::Program(program) => &user.program == program,
            UserFilter::Term(term) => user.term == *term,
        }
    }
}

/// Description of a user collection: everybody, narrowed by each filter in turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    filters: Vec<UserFilter>,
}

impl UserQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: UserFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[UserFilter] {
        &self.filters
    }

    pub fn matches(&self, user: &User) -> bool {
        self.filters.iter().all(|filter| filter.matches(user))
    }
}

#[async_trait]
pub trait UserSearchRepo: Send + Sync + Debug {
    fn get_all(&self) -> UserQuery {
        UserQuery::all()
    }

    fn filter_by_query(&self, users: UserQuery, query: &str) -> UserQuery {
        users.and(UserFilter::Text(query.to_string()))
    }

    fn filter_by_program(&self, users: UserQuery, program: &str) -> UserQuery {
        users.and(UserFilter::Program(program.to_string()))
    }

    fn filter_by_term(&self, users: UserQuery, term: i32) -> UserQuery {
        users.and(UserFilter::Term(term))
    }

    /// run the query
    async fn fetch(&self, users: &UserQuery) -> Result<Vec<User>>;
}

/// A search result that has not been loaded yet.
#[derive(Debug, Clone)]
pub struct LazyUsers {
    repo: Arc<dyn UserSearchRepo>,
    query: UserQuery,
}

impl LazyUsers {
    pub fn query(&self) -> &UserQuery {
        &self.query
    }

    pub async fn fetch(&self) -> Result<Vec<User>> {
        self.repo.fetch(&self.query).await
    }
}

#[derive(Debug, Clone)]
pub struct UserSearchService {
    repo: Arc<dyn UserSearchRepo>,
}

impl UserSearchService {
    pub fn new(repo: Arc<dyn UserSearchRepo>) -> Self {
        Self { repo }
    }

    /// text, then program, then term; absent criteria are skipped
    pub fn search(&self, criteria: &SearchCriteria) -> LazyUsers {
        let mut users = self.repo.get_all();
        if let Some(query) = &criteria.query {
            users = self.repo.filter_by_query(users, query);
        }
        if let Some(program) = &criteria.program {
            users = self.repo.filter_by_program(users, program);
        }
        if let Some(term) = criteria.term {
            users = self.repo.filter_by_term(users, term);
        }
        debug!("user search: {:?}", users);
        LazyUsers {
            repo: self.repo.clone(),
            query: users,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::memory::MemoryUser;
    use crate::UserRepo;

    fn student(id: &str, first: &str, last: &str, program: &str, term: i32) -> User {
        User {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{id}@eafit.edu.co"),
            program: program.to_string(),
            term,
            create_time: 0,
        }
    }

    async fn seeded() -> Arc<MemoryUser> {
        let repo = Arc::new(MemoryUser::new());
        for user in [
            student("ana", "Ana", "Gomez", "Systems", 3),
            student("bruno", "Bruno", "Diaz", "Systems", 5),
            student("carla", "Carla", "Anaya", "Law", 3),
            student("dario", "Dario", "Perez", "Systems", 3),
        ] {
            repo.create_user(user).await.unwrap();
        }
        repo
    }

    fn ids(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    #[tokio::test]
    async fn no_criteria_returns_everyone() {
        let service = UserSearchService::new(seeded().await);
        let lazy = service.search(&SearchCriteria::default());
        assert!(lazy.query().filters().is_empty());
        assert_eq!(lazy.fetch().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn text_matches_names_and_email_ignoring_case() {
        let service = UserSearchService::new(seeded().await);
        let users = service
            .search(&SearchCriteria::default().with_query("ANA"))
            .fetch()
            .await
            .unwrap();
        // "Ana" first name, "Anaya" last name
        assert_eq!(ids(&users), vec!["ana", "carla"]);

        let users = service
            .search(&SearchCriteria::default().with_query("bruno@EAFIT"))
            .fetch()
            .await
            .unwrap();
        assert_eq!(ids(&users), vec!["bruno"]);
    }

    #[tokio::test]
    async fn all_criteria_intersect() {
        let service = UserSearchService::new(seeded().await);
        let criteria = SearchCriteria::default()
            .with_query("a")
            .with_program("Systems")
            .with_term(3);
        let lazy = service.search(&criteria);
        assert_eq!(
            lazy.query().filters(),
            &[
                UserFilter::Text("a".to_string()),
                UserFilter::Program("Systems".to_string()),
                UserFilter::Term(3),
            ]
        );
        assert_eq!(ids(&lazy.fetch().await.unwrap()), vec!["ana", "dario"]);
    }

    #[tokio::test]
    async fn present_but_empty_criteria_still_filter() {
        let service = UserSearchService::new(seeded().await);
        // empty text matches everybody, but the empty program matches nobody
        let criteria = SearchCriteria::default().with_query("").with_program("");
        let lazy = service.search(&criteria);
        assert_eq!(lazy.query().filters().len(), 2);
        assert!(lazy.fetch().await.unwrap().is_empty());

        let users = service
            .search(&SearchCriteria::default().with_term(0))
            .fetch()
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[derive(Debug, Default)]
    struct CountingRepo {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl UserSearchRepo for CountingRepo {
        async fn fetch(&self, _users: &UserQuery) -> Result<Vec<User>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn search_is_deferred_until_fetch() {
        let repo = Arc::new(CountingRepo::default());
        let service = UserSearchService::new(repo.clone());
        let lazy = service.search(&SearchCriteria::default().with_program("Law"));
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 0);
        lazy.fetch().await.unwrap();
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
    }
}
