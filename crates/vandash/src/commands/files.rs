//! File manager command handlers.

use tabled::Tabled;

use vandash_core::files::format_file_size;
use vandash_core::{Command as CoreCommand, Dashboard, FileItem, FileKind, FileManager, ListingView};

use crate::cli::{FilesArgs, FilesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Locked")]
    locked: &'static str,
}

impl From<&FileItem> for FileRow {
    fn from(f: &FileItem) -> Self {
        let folder = f.kind == FileKind::Folder;
        Self {
            name: if folder {
                format!("{}/", f.name)
            } else {
                f.name.clone()
            },
            kind: if folder { "folder" } else { "file" },
            size: format_file_size(f.size),
            modified: f.modified.clone().unwrap_or_default(),
            locked: if folder && f.locked { "yes" } else { "" },
        }
    }
}

/// Wait for the current folder's listing and print it.
async fn print_listing(files: &FileManager, global: &GlobalOpts) -> Result<(), CliError> {
    let path = files.current_path();
    let items: Vec<FileItem> = match files.load().await {
        ListingView::Items { items, .. } => items.as_ref().clone(),
        ListingView::Empty => Vec::new(),
        ListingView::Locked { folder } => return Err(CliError::Locked { path: folder.path }),
        ListingView::Error(err) => return Err(CliError::for_path(err, &path)),
        ListingView::Loading => {
            return Err(CliError::Internal(format!("no listing received for '{path}'")));
        }
    };

    if items.is_empty() && global.output == crate::cli::OutputFormat::Table {
        output::notice("Folder is empty", global.quiet);
        return Ok(());
    }
    let out = output::render_list(global.output, &items, |f| FileRow::from(f), |f| f.path.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Echo the toast a file operation left behind.
fn report(dashboard: &Dashboard, global: &GlobalOpts) {
    if let Some(message) = dashboard.toaster().current().message {
        output::notice(&message, global.quiet);
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: FilesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FilesCommand::Ls { path } => {
            let files = dashboard.files();
            files.navigate(&path);
            print_listing(&files, global).await
        }

        FilesCommand::Upload { files: paths, to } => {
            let uploads = paths
                .iter()
                .map(|p| util::read_upload(p))
                .collect::<Result<Vec<_>, _>>()?;
            let files = dashboard.files();
            files.navigate(&to);
            let count = files
                .upload(uploads)
                .await
                .map_err(|e| CliError::for_path(e, &to))?;
            tracing::info!(count, folder = %to, "upload finished");
            report(dashboard, global);
            Ok(())
        }

        FilesCommand::Mkdir { name, parent } => {
            let files = dashboard.files();
            files.navigate(&parent);
            let created = files
                .create_folder(&name)
                .await
                .map_err(|e| CliError::for_path(e, &parent))?;
            report(dashboard, global);
            output::print_output(&created.path, global.quiet);
            Ok(())
        }

        FilesCommand::Rm { path } => {
            if !util::confirm(&format!("Delete '{path}'?"), global.yes)? {
                return Ok(());
            }
            dashboard
                .execute(CoreCommand::DeleteFile { path: path.clone() })
                .await
                .map_err(|e| CliError::for_path(e, &path))?;
            output::notice(&format!("Deleted {path}"), global.quiet);
            Ok(())
        }

        FilesCommand::Lock { path } => {
            dashboard
                .execute(CoreCommand::LockFolder { path: path.clone() })
                .await?;
            output::notice("Folder locked", global.quiet);
            Ok(())
        }

        FilesCommand::Unlock { path } => {
            dashboard
                .execute(CoreCommand::UnlockFolder { path: path.clone() })
                .await
                .map_err(|e| CliError::for_path(e, &path))?;
            output::notice("Folder unlocked", global.quiet);
            Ok(())
        }

        FilesCommand::Auth {
            path,
            password_stdin,
        } => {
            let password = util::read_password(password_stdin)?;
            let files = dashboard.files();
            files.authenticate(&path, password).await?;
            report(dashboard, global);
            print_listing(&files, global).await
        }

        FilesCommand::Url { path } => {
            let url = dashboard.files().file_url(&path)?;
            output::print_output(url.as_str(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, kind: FileKind, size: Option<u64>, locked: bool) -> FileItem {
        FileItem {
            name: name.into(),
            kind,
            size,
            modified: None,
            path: name.into(),
            locked,
        }
    }

    #[test]
    fn folders_are_marked_and_sizeless() {
        let row = FileRow::from(&item("photos", FileKind::Folder, None, true));
        assert_eq!(row.name, "photos/");
        assert_eq!(row.kind, "folder");
        assert_eq!(row.size, "");
        assert_eq!(row.locked, "yes");
    }

    #[test]
    fn files_show_human_sizes() {
        let row = FileRow::from(&item("a.jpg", FileKind::File, Some(2048), false));
        assert_eq!(row.name, "a.jpg");
        assert_eq!(row.size, "2.0 KB");
        assert_eq!(row.locked, "");
    }
}
