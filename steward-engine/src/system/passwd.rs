//! Minimal passwd/group file parsing, rooted at a host root so probes can
//! run against fixture trees.

use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PasswdEntry {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub gecos: String,
    pub home: String,
    pub shell: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GroupEntry {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

/// Parse `<root>/etc/passwd`. A missing file yields no entries.
pub(crate) fn passwd_entries(root: &Path) -> io::Result<Vec<PasswdEntry>> {
    let path = root.join("etc").join("passwd");
    let Some(content) = read_optional(&path)? else {
        return Ok(vec![]);
    };
    Ok(content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 7 {
                return None;
            }
            Some(PasswdEntry {
                name: fields[0].to_string(),
                uid: fields[2].parse().ok()?,
                gid: fields[3].parse().ok()?,
                gecos: fields[4].to_string(),
                home: fields[5].to_string(),
                shell: fields[6].to_string(),
            })
        })
        .collect())
}

/// Parse `<root>/etc/group`. A missing file yields no entries.
pub(crate) fn group_entries(root: &Path) -> io::Result<Vec<GroupEntry>> {
    let path = root.join("etc").join("group");
    let Some(content) = read_optional(&path)? else {
        return Ok(vec![]);
    };
    Ok(content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 4 {
                return None;
            }
            Some(GroupEntry {
                name: fields[0].to_string(),
                gid: fields[2].parse().ok()?,
                members: fields[3]
                    .split(',')
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect(),
            })
        })
        .collect())
}

pub(crate) fn user_by_name(root: &Path, name: &str) -> io::Result<Option<PasswdEntry>> {
    Ok(passwd_entries(root)?.into_iter().find(|e| e.name == name))
}

pub(crate) fn user_name_for_uid(root: &Path, uid: u32) -> io::Result<Option<String>> {
    Ok(passwd_entries(root)?
        .into_iter()
        .find(|e| e.uid == uid)
        .map(|e| e.name))
}

pub(crate) fn group_by_name(root: &Path, name: &str) -> io::Result<Option<GroupEntry>> {
    Ok(group_entries(root)?.into_iter().find(|e| e.name == name))
}

pub(crate) fn group_name_for_gid(root: &Path, gid: u32) -> io::Result<Option<String>> {
    Ok(group_entries(root)?
        .into_iter()
        .find(|e| e.gid == gid)
        .map(|e| e.name))
}

fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let root = TempDir::new().expect("tempdir");
        let etc = root.path().join("etc");
        std::fs::create_dir_all(&etc).expect("mkdir");
        std::fs::write(
            etc.join("passwd"),
            "root:x:0:0:root:/root:/bin/bash\n\
             cassandra:x:105:108:Cassandra Server user:/usr/local/cassandra:/bin/bash\n",
        )
        .expect("write passwd");
        std::fs::write(
            etc.join("group"),
            "root:x:0:\ncassandra:x:108:cassandra,backup\n",
        )
        .expect("write group");
        root
    }

    #[test]
    fn user_lookup_by_name_and_uid() {
        let root = fixture();
        let user = user_by_name(root.path(), "cassandra")
            .expect("read")
            .expect("entry");
        assert_eq!(user.uid, 105);
        assert_eq!(user.home, "/usr/local/cassandra");
        assert_eq!(user.gecos, "Cassandra Server user");

        assert_eq!(
            user_name_for_uid(root.path(), 105).expect("read").as_deref(),
            Some("cassandra")
        );
        assert_eq!(user_name_for_uid(root.path(), 999).expect("read"), None);
    }

    #[test]
    fn group_members_are_split() {
        let root = fixture();
        let group = group_by_name(root.path(), "cassandra")
            .expect("read")
            .expect("entry");
        assert_eq!(group.members, vec!["cassandra", "backup"]);

        let empty = group_by_name(root.path(), "root")
            .expect("read")
            .expect("entry");
        assert!(empty.members.is_empty());
    }

    #[test]
    fn missing_files_mean_no_entries() {
        let root = TempDir::new().expect("tempdir");
        assert!(passwd_entries(root.path()).expect("read").is_empty());
        assert!(group_entries(root.path()).expect("read").is_empty());
        assert_eq!(group_name_for_gid(root.path(), 0).expect("read"), None);
    }
}
