use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use nomin::build::{build_site, BuildSummary};
use nomin::config::{BuildOptions, Config, Overrides, Paths, Site};
use tempfile::TempDir;
use walkdir::WalkDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const POST_LAYOUT: &str = "{{ if .index }}INDEX {{ end }}{{ .title }}|{{ .formattedDate }}|\
    prev={{ if .prevPage }}{{ .prevPage.link }}{{ end }}|\
    next={{ if .nextPage }}{{ .nextPage.link }}{{ end }}|{{ .content }}";

const ARCHIVE_LAYOUT: &str =
    "{{ range .archives }}{{ .link }} {{ .title }} ({{ .formattedDate }})\n{{ end }}";

const FEED_LAYOUT: &str =
    "updated={{ .updated }}\n{{ range .feeds }}{{ .date }} {{ .link }} {{ .title }}\n{{ end }}";

/// A site project in a temporary directory with the three test layouts.
struct Project {
    _dir: TempDir,
    paths: Paths,
}

impl Project {
    fn new() -> std::io::Result<Project> {
        let dir = TempDir::new()?;
        let paths = Paths::new(dir.path());
        fs::create_dir_all(&paths.posts)?;
        fs::create_dir_all(&paths.layouts)?;
        fs::write(paths.layouts.join("post.html"), POST_LAYOUT)?;
        fs::write(paths.layouts.join("archive.html"), ARCHIVE_LAYOUT)?;
        fs::write(paths.layouts.join("atom.xml"), FEED_LAYOUT)?;
        Ok(Project { _dir: dir, paths })
    }

    fn post(&self, file_name: &str, title: &str, date: &str) -> std::io::Result<()> {
        fs::write(
            self.paths.posts.join(file_name),
            format!("---\ntitle: {}\ndate: {}\n---\n{} body\n", title, date, title),
        )
    }

    fn read(&self, relative: &str) -> std::io::Result<String> {
        fs::read_to_string(self.paths.public.join(relative))
    }

    fn build(&self, options: &BuildOptions) -> Result<BuildSummary, nomin::build::Error> {
        build_site(&self.paths, options, &Site::default())
    }
}

/// Reads every file under `dir` into memory, keyed by relative path.
fn snapshot(dir: &Path) -> Result<BTreeMap<PathBuf, Vec<u8>>, Box<dyn std::error::Error>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.insert(
                entry.path().strip_prefix(dir)?.to_owned(),
                fs::read(entry.path())?,
            );
        }
    }
    Ok(files)
}

fn copy_tree(src: &Path, dst: &Path) -> TestResult {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let target = dst.join(entry.path().strip_prefix(src)?);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[test]
fn test_post_pages_form_a_chain_newest_first() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-first.md", "First", "2020-01-01")?;
    project.post("2020-03-01-third.md", "Third", "2020-03-01")?;
    project.post("2020-02-01-second.md", "Second", "2020-02-01")?;

    let summary = project.build(&BuildOptions::default())?;
    assert_eq!(3, summary.posts);

    assert_eq!(
        "Third|Mar 1st, 2020|prev=|next=/second/|<p>Third body</p>\n",
        project.read("third/index.html")?
    );
    assert_eq!(
        "Second|Feb 1st, 2020|prev=/third/|next=/first/|<p>Second body</p>\n",
        project.read("second/index.html")?
    );
    assert_eq!(
        "First|Jan 1st, 2020|prev=/second/|next=|<p>First body</p>\n",
        project.read("first/index.html")?
    );
    Ok(())
}

#[test]
fn test_home_page_is_the_newest_post() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-old.md", "Old", "2020-01-01")?;
    project.post("2021-06-15-new.md", "New", "2021-06-15")?;
    project.build(&BuildOptions::default())?;

    let home = project.read("index.html")?;
    assert_eq!(format!("INDEX {}", project.read("new/index.html")?), home);
    Ok(())
}

#[test]
fn test_feed_holds_newest_posts_up_to_feed_size() -> TestResult {
    let project = Project::new()?;
    for day in 1..=7 {
        project.post(
            &format!("2020-01-0{}-post-{}.md", day, day),
            &format!("Post {}", day),
            &format!("2020-01-0{}", day),
        )?;
    }

    let summary = project.build(&BuildOptions::default())?;
    assert_eq!(5, summary.feed_items);
    assert_eq!(
        "updated=2020-01-07T00:00:00+00:00\n\
         2020-01-07T00:00:00+00:00 /post-7/ Post 7\n\
         2020-01-06T00:00:00+00:00 /post-6/ Post 6\n\
         2020-01-05T00:00:00+00:00 /post-5/ Post 5\n\
         2020-01-04T00:00:00+00:00 /post-4/ Post 4\n\
         2020-01-03T00:00:00+00:00 /post-3/ Post 3\n",
        project.read("atom.xml")?
    );

    let options = BuildOptions {
        feed_size: 50,
        ..BuildOptions::default()
    };
    assert_eq!(7, project.build(&options)?.feed_items);
    assert_eq!(8, project.read("atom.xml")?.lines().count());
    Ok(())
}

#[test]
fn test_archive_lists_every_post() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;
    project.post("2020-01-02-b.md", "B", "2020-01-02")?;

    let summary = project.build(&BuildOptions::default())?;
    assert_eq!(Some(2), summary.archive_items);
    assert_eq!(
        "/b/ B (Jan 2nd, 2020)\n/a/ A (Jan 1st, 2020)\n",
        fs::read_to_string(project.paths.archive.join("index.html"))?
    );
    Ok(())
}

#[test]
fn test_disabled_archive_creates_no_directory() -> TestResult {
    let project = Project::new()?;
    fs::remove_file(project.paths.layouts.join("archive.html"))?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;

    let options = BuildOptions {
        generate_archive: false,
        ..BuildOptions::default()
    };
    let summary = project.build(&options)?;
    assert_eq!(None, summary.archive_items);
    assert!(!project.paths.archive.exists());
    assert!(project.paths.public.join("a/index.html").is_file());
    Ok(())
}

#[test]
fn test_base_path_prefixes_links_not_output_paths() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;
    project.post("2020-01-02-b.md", "B", "2020-01-02")?;

    let options = BuildOptions {
        base_path: String::from("/blog"),
        ..BuildOptions::default()
    };
    project.build(&options)?;
    assert_eq!(
        "B|Jan 2nd, 2020|prev=|next=/blog/a/|<p>B body</p>\n",
        project.read("b/index.html")?
    );
    Ok(())
}

#[test]
fn test_static_assets_overwrite_generated_files() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;
    fs::create_dir_all(project.paths.static_assets.join("img"))?;
    fs::write(project.paths.static_assets.join("atom.xml"), "static feed")?;
    fs::write(project.paths.static_assets.join("img/logo.svg"), "<svg/>")?;

    let summary = project.build(&BuildOptions::default())?;
    assert_eq!(2, summary.static_files);
    assert_eq!("static feed", project.read("atom.xml")?);
    assert_eq!("<svg/>", project.read("img/logo.svg")?);
    Ok(())
}

#[test]
fn test_rebuild_is_byte_identical() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;
    project.post("2020-01-01-b.md", "B", "2020-01-01")?;
    project.post("2020-02-01-c.md", "C", "2020-02-01T12:00:00+02:00")?;
    fs::create_dir_all(&project.paths.static_assets)?;
    fs::write(project.paths.static_assets.join("robots.txt"), "User-agent: *\n")?;

    project.build(&BuildOptions::default())?;
    let first = snapshot(&project.paths.public)?;
    project.build(&BuildOptions::default())?;
    let second = snapshot(&project.paths.public)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_builtin_feed_without_feed_layout() -> TestResult {
    let project = Project::new()?;
    fs::remove_file(project.paths.layouts.join("atom.xml"))?;
    project.post("2020-01-01-a.md", "Alpha", "2020-01-01")?;

    let site = Site {
        title: Some(String::from("Test Blog")),
        url: Some(String::from("https://example.org/")),
        author: None,
    };
    build_site(&project.paths, &BuildOptions::default(), &site)?;
    let xml = project.read("atom.xml")?;
    assert!(xml.contains("Test Blog"), "{}", xml);
    assert!(xml.contains("https://example.org/a/"), "{}", xml);
    assert!(xml.contains("Alpha"), "{}", xml);
    Ok(())
}

#[test]
fn test_empty_posts_directory() -> TestResult {
    let project = Project::new()?;
    let summary = project.build(&BuildOptions::default())?;
    assert_eq!(0, summary.posts);
    assert!(!project.paths.public.join("index.html").exists());
    assert_eq!("updated=1970-01-01T00:00:00+00:00\n", project.read("atom.xml")?);
    assert_eq!("", fs::read_to_string(project.paths.archive.join("index.html"))?);
    Ok(())
}

#[test]
fn test_malformed_post_aborts_build() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;
    fs::write(project.paths.posts.join("2020-01-02-bad.md"), "no frontmatter here\n")?;

    let err = project.build(&BuildOptions::default()).expect_err("the build must fail");
    assert!(err.to_string().contains("2020-01-02-bad.md"), "{}", err);
    assert!(!project.paths.public.join("a/index.html").exists());
    Ok(())
}

#[test]
fn test_post_cannot_take_a_generated_path() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;
    project.post("2020-01-02-archive.md", "Archive", "2020-01-02")?;

    let err = project.build(&BuildOptions::default()).expect_err("archive is reserved");
    assert!(err.to_string().contains("2020-01-02-archive.md"), "{}", err);
    assert!(!project.paths.public.exists());

    let options = BuildOptions {
        generate_archive: false,
        ..BuildOptions::default()
    };
    project.build(&options)?;
    assert!(project.read("archive/index.html")?.starts_with("Archive|"));
    Ok(())
}

#[test]
fn test_post_cannot_replace_the_feed() -> TestResult {
    let project = Project::new()?;
    project.post("2020-01-01-a.md", "A", "2020-01-01")?;
    fs::write(
        project.paths.posts.join("feed.md"),
        "---\ntitle: Feed\ndate: 2020-01-02\npermalink: atom.xml\n---\n",
    )?;

    let err = project.build(&BuildOptions::default()).expect_err("atom.xml is reserved");
    assert!(err.to_string().contains("atom.xml"), "{}", err);
    assert!(!project.paths.public.join("a/index.html").exists());
    Ok(())
}

#[test]
fn test_demo_site_builds() -> TestResult {
    let dir = TempDir::new()?;
    copy_tree(
        &Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/blog"),
        dir.path(),
    )?;
    let paths = Paths::new(dir.path());
    let config = Config::load(&paths, &Overrides::default())?;
    let summary = build_site(&paths, &config.options, &config.site)?;

    assert_eq!(2, summary.posts);
    let home = fs::read_to_string(paths.public.join("index.html"))?;
    assert!(home.contains("Second post"), "{}", home);
    assert!(home.contains("/hello-world/"), "{}", home);
    assert!(paths.public.join("hello-world/index.html").is_file());
    assert!(paths.public.join("style.css").is_file());
    let archive = fs::read_to_string(paths.archive.join("index.html"))?;
    assert!(archive.contains("Apr 25th, 2020"), "{}", archive);
    Ok(())
}
