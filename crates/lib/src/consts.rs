//! File-layout and naming conventions shared by every pipeline stage.

pub const APP_NAME: &str = "rpmbuilder";

/// Suffix identifying the build-description file in the working directory.
pub const SPEC_SUFFIX: &str = ".spec";

/// Extension (matched case-insensitively) of produced binary packages.
pub const RPM_EXTENSION: &str = ".rpm";

/// Suffix of architecture-independent packages eligible for installation.
pub const NOARCH_RPM_SUFFIX: &str = ".noarch.rpm";

/// Line in the spec file after which changelog entries are injected.
pub const CHANGELOG_MARKER: &str = "%changelog";

/// rpmbuild token expanding to nothing.
pub const NIL_MACRO: &str = "%{nil}";

/// Release suffix appended to every wrapped build.
pub const RELEASE_SUFFIX: &str = ".1";

/// Subdirectories of the output directory.
pub const BUILD_DIR: &str = "build";
pub const SPEC_DIR: &str = "spec";
pub const DEPENDENCY_DIR: &str = "dependency";
pub const NOARCH_DIR: &str = "noarch";

pub const DEFAULT_RPMBUILD: &str = "rpmbuild";

/// Build both binary and source packages.
pub const BUILD_ALL_FLAG: &str = "-ba";

pub const RPM2CPIO: &str = "rpm2cpio";
pub const CPIO: &str = "cpio";

/// Maximum number of bytes forwarded per output line of an external process.
pub const MAX_LINE_LENGTH: usize = 8192;

pub const DEFAULT_CHANGELOG_EMAIL: &str = "project-ncl@redhat.com";
pub const DEFAULT_CHANGELOG_MESSAGE: &str = "- New Release";

pub const DEFAULT_CHECKSUM_ALGORITHMS: &str = "SHA-1,MD5";
pub const DEFAULT_OMIT_CHECKSUMS_FOR_EXTENSIONS: &str = ".asc,.sigstore";
