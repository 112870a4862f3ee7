// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProjectId},
};

/// Projects operations may touch; an empty set means unrestricted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedProjects(BTreeSet<ProjectId>);
impl AllowedProjects {
	/// Creates a restricted set from validated identifiers.
	pub fn new<I>(projects: I) -> Self
	where
		I: IntoIterator<Item = ProjectId>,
	{
		Self(projects.into_iter().collect())
	}

	/// Whether every project is allowed.
	pub fn is_unrestricted(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of listed projects.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether no project is listed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Listed projects in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &ProjectId> {
		self.0.iter()
	}

	/// Whether `project_id` may be touched.
	pub fn is_project_allowed(&self, project_id: &str) -> bool {
		self.is_unrestricted() || self.0.contains(project_id)
	}

	/// Whether every identifier may be touched; vacuously true for an empty slice.
	pub fn are_all_projects_allowed<S>(&self, project_ids: &[S]) -> bool
	where
		S: AsRef<str>,
	{
		self.first_disallowed(project_ids).is_none()
	}

	/// First identifier, in argument order, that is not allowed.
	pub fn first_disallowed<'a, S>(&self, project_ids: &'a [S]) -> Option<&'a str>
	where
		S: AsRef<str>,
	{
		project_ids.iter().map(|id| id.as_ref()).find(|id| !self.is_project_allowed(id))
	}
}
impl FromStr for AllowedProjects {
	type Err = IdentifierError;

	/// Parses a comma-separated list, ignoring blanks around and between entries.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.split(',')
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(ProjectId::new)
			.collect::<Result<BTreeSet<_>, _>>()
			.map(Self)
	}
}
impl FromIterator<ProjectId> for AllowedProjects {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = ProjectId>,
	{
		Self::new(iter)
	}
}
