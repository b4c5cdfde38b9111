//! Amazon Resource Name parsing, used to validate role identifiers before any network call.

// self
use crate::_prelude::*;

const ARN_PREFIX: &str = "arn:";
const ARN_SECTIONS: usize = 6;

/// Error returned when an ARN fails to parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ArnError {
	/// The value does not start with `arn:`.
	#[error("ARN must start with `arn:`.")]
	InvalidPrefix,
	/// Fewer than six colon-separated sections were found.
	#[error("ARN must contain {expected} colon-separated sections, found {found}.")]
	NotEnoughSections {
		/// Required section count.
		expected: usize,
		/// Section count that was found.
		found: usize,
	},
	/// A mandatory component is empty.
	#[error("ARN {component} cannot be empty.")]
	EmptyComponent {
		/// Name of the empty component (partition, service, resource).
		component: &'static str,
	},
}

/// Parsed `arn:partition:service:region:account-id:resource` identifier.
///
/// Region and account may be empty (IAM ARNs omit the region); everything after the fifth
/// colon belongs to the resource, so resources may themselves contain colons.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Arn {
	/// Partition, e.g. `aws` or `aws-cn`.
	pub partition: String,
	/// Service namespace, e.g. `iam`.
	pub service: String,
	/// Region, empty for global services.
	pub region: String,
	/// Owning account identifier.
	pub account_id: String,
	/// Resource path, e.g. `role/Example`.
	pub resource: String,
}
impl Arn {
	/// Parses and validates an ARN string.
	pub fn parse(value: impl AsRef<str>) -> Result<Self, ArnError> {
		let view = value.as_ref();
		let rest = view.strip_prefix(ARN_PREFIX).ok_or(ArnError::InvalidPrefix)?;
		let sections = rest.splitn(ARN_SECTIONS - 1, ':').collect::<Vec<_>>();

		if sections.len() != ARN_SECTIONS - 1 {
			return Err(ArnError::NotEnoughSections {
				expected: ARN_SECTIONS,
				found: sections.len() + 1,
			});
		}

		let arn = Self {
			partition: sections[0].to_owned(),
			service: sections[1].to_owned(),
			region: sections[2].to_owned(),
			account_id: sections[3].to_owned(),
			resource: sections[4].to_owned(),
		};

		arn.validate()?;

		Ok(arn)
	}

	/// Returns `true` if the ARN names an IAM role.
	pub fn is_iam_role(&self) -> bool {
		self.service == "iam" && self.resource.starts_with("role/")
	}

	fn validate(&self) -> Result<(), ArnError> {
		for (component, value) in [
			("partition", &self.partition),
			("service", &self.service),
			("resource", &self.resource),
		] {
			if value.is_empty() {
				return Err(ArnError::EmptyComponent { component });
			}
		}

		Ok(())
	}
}
impl Debug for Arn {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Arn({self})")
	}
}
impl Display for Arn {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"{ARN_PREFIX}{}:{}:{}:{}:{}",
			self.partition, self.service, self.region, self.account_id, self.resource
		)
	}
}
impl FromStr for Arn {
	type Err = ArnError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl TryFrom<String> for Arn {
	type Error = ArnError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}
impl From<Arn> for String {
	fn from(value: Arn) -> Self {
		value.to_string()
	}
}
