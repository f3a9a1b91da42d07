//! Drops travel from the host translator over the bridge into a live editor.

use weft_bridge::{Messenger, memory_pair};
use weft_editor_core::EditorConfig;
use weft_editor_webview::api::DEFAULT_CHANNEL;
use weft_editor_webview::init_editor;
use weft_host::{
    DropEvent, DropResult, DropTranslator, DroppedFile, EditorRemote, HostError, Note, NoteLookup,
    host_interface,
};

struct Library;

impl NoteLookup for Library {
    async fn load(&self, id: &str) -> Result<Note, HostError> {
        match id {
            "recipe" => Ok(Note::new("recipe", "Bread [v2]")),
            "todo" => Ok(Note::new("todo", "Todo")),
            _ => Err(HostError::NoteResolutionFailed {
                id: id.into(),
                reason: "deleted".into(),
            }),
        }
    }
}

async fn wait(result: DropResult) {
    match result {
        DropResult::Claimed(task) => {
            task.await.unwrap().unwrap();
        }
        DropResult::Ignored => panic!("drop ignored"),
    }
}

#[tokio::test]
async fn dropped_notes_and_files_become_links() {
    let (host_end, view_end) = memory_pair();
    let session = init_editor("", EditorConfig::default(), view_end.port);
    session.spawn_serve(view_end.inbound);

    let messenger = Messenger::new(DEFAULT_CHANNEL, host_end.port);
    messenger.set_local_interface(host_interface(|_| {}));
    messenger.spawn_serve(host_end.inbound);
    let remote = EditorRemote::new(messenger);
    let translator = DropTranslator::new(remote.clone(), Library);

    wait(translator.handle(&DropEvent::notes(&["recipe", "gone", "todo"])).unwrap()).await;
    assert_eq!(
        remote.get_value().await.unwrap(),
        r"[Bread \[v2\]](:/recipe)
[Todo](:/todo)"
    );

    remote.set_value("").await.unwrap();
    let files = DropEvent::files(
        vec![DroppedFile::at("/home/me/My Notes.md"), DroppedFile::default()],
        true,
    );
    wait(translator.handle(&files).unwrap()).await;
    assert_eq!(
        remote.get_value().await.unwrap(),
        "[My Notes.md](file:///home/me/My%20Notes.md)"
    );
}
