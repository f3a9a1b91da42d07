//! The editor session: one editor control bound to one messenger.

use std::sync::{Arc, Mutex, MutexGuard};

use n0_future::Stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;
use weft_bridge::{LocalInterface, Messenger, Transport};
use weft_editor_core::{EditorConfig, EditorControl, KeyBinding, KeyCombo, KeydownResult, LayerId};

use crate::api::{self, ExecCommandArgs, KeymapBindingArgs, SelectArgs, SetCursorArgs, editor, host};
use crate::error::SessionError;

type SharedControl = Arc<Mutex<EditorControl>>;

/// Create an editor session on the default channel.
pub fn init_editor<T: Transport>(initial: &str, settings: EditorConfig, transport: T) -> EditorSession<T> {
    EditorSession::new(api::DEFAULT_CHANNEL, initial, settings, transport)
}

/// An editor control exposed to the host over a messenger.
///
/// The control is shared with the messenger's handlers behind a mutex that is
/// only ever held for the duration of one synchronous call. Dropping the session
/// detaches the interface and closes the messenger, which ends its serve loop
/// and releases the transport.
pub struct EditorSession<T: Transport> {
    control: SharedControl,
    messenger: Messenger<T>,
}

impl<T: Transport> EditorSession<T> {
    pub fn new(channel: impl Into<SmolStr>, initial: &str, settings: EditorConfig, transport: T) -> Self {
        let messenger = Messenger::new(channel, transport);
        let mut control = EditorControl::new(initial, settings);

        let events = messenger.clone();
        control.on_event(move |event| {
            if let Err(e) = events.notify(host::ON_EDITOR_EVENT, &event) {
                tracing::debug!(error = %e, "dropping editor event");
            }
        });
        let log = messenger.clone();
        control.on_log(move |message| {
            if let Err(e) = log.notify(host::LOG_MESSAGE, &message) {
                tracing::debug!(error = %e, "dropping editor log message");
            }
        });

        let control = Arc::new(Mutex::new(control));
        messenger.set_local_interface(editor_interface(&control));
        tracing::debug!(channel = messenger.channel(), "editor session ready");
        Self { control, messenger }
    }

    /// Run `f` with exclusive access to the editor control.
    ///
    /// This is how the embedding page registers commands, adds extensions and
    /// feeds key presses. Do not call back into the session from `f`.
    pub fn with_control<R>(&self, f: impl FnOnce(&mut EditorControl) -> R) -> R {
        f(&mut lock(&self.control))
    }

    pub fn value(&self) -> String {
        lock(&self.control).get_value()
    }

    /// Dispatch a key chord such as `Ctrl-d` through the editor's keymaps.
    pub fn handle_key(&self, chord: &str) -> Result<KeydownResult, SessionError> {
        let mut control = lock(&self.control);
        let combo = KeyCombo::parse(chord, control.state().settings().mac_keymap)?;
        Ok(control.handle_key(&combo))
    }

    pub fn messenger(&self) -> &Messenger<T> {
        &self.messenger
    }

    /// Send a log line to the host.
    pub fn log_to_host(&self, message: &str) -> Result<(), SessionError> {
        Ok(self.messenger.notify(host::LOG_MESSAGE, message)?)
    }

    /// Process messages from the host until the inbound stream ends.
    pub async fn serve<S>(&self, inbound: S)
    where
        S: Stream<Item = String> + Unpin,
    {
        self.messenger.clone().serve(inbound).await
    }

    pub fn spawn_serve<S>(&self, inbound: S) -> n0_future::task::JoinHandle<()>
    where
        S: Stream<Item = String> + Unpin + Send + 'static,
    {
        self.messenger.spawn_serve(inbound)
    }
}

impl<T: Transport> Drop for EditorSession<T> {
    fn drop(&mut self) {
        // The handlers own the control and the control's sinks own the
        // messenger; clearing the interface breaks that cycle.
        self.messenger.set_local_interface(LocalInterface::new());
        self.messenger.close();
    }
}

fn lock(control: &Mutex<EditorControl>) -> MutexGuard<'_, EditorControl> {
    control.lock().unwrap_or_else(|e| e.into_inner())
}

/// Add one method that runs against the locked control.
fn bind<A, R, F>(local: LocalInterface, name: &str, control: &SharedControl, f: F) -> LocalInterface
where
    A: DeserializeOwned,
    R: Serialize,
    F: Fn(&mut EditorControl, A) -> Result<R, SessionError> + Send + Sync + 'static,
{
    let control = control.clone();
    local.method(name, move |args: A| {
        let mut editor = lock(&control);
        f(&mut editor, args)
    })
}

fn editor_interface(control: &SharedControl) -> LocalInterface {
    let mut local = LocalInterface::new();
    local = bind(local, editor::INSERT_TEXT, control, |ed, text: String| {
        ed.insert_text(&text);
        Ok(())
    });
    local = bind(local, editor::EXEC_COMMAND, control, |ed, call: ExecCommandArgs| {
        Ok(ed.exec_command(&call.name, call.args)?)
    });
    local = bind(local, editor::SUPPORTS_COMMAND, control, |ed, name: String| {
        Ok(ed.supports_command(&name))
    });
    local = bind(local, editor::UNDO, control, |ed, _: Value| Ok(ed.undo()));
    local = bind(local, editor::REDO, control, |ed, _: Value| Ok(ed.redo()));
    local = bind(local, editor::CLEAR_HISTORY, control, |ed, _: Value| {
        ed.clear_history();
        Ok(())
    });
    local = bind(local, editor::GET_VALUE, control, |ed, _: Value| Ok(ed.get_value()));
    local = bind(local, editor::SET_VALUE, control, |ed, text: String| {
        ed.set_value(&text);
        Ok(())
    });
    local = bind(local, editor::SELECT, control, |ed, sel: SelectArgs| {
        ed.select(sel.anchor, sel.head);
        Ok(())
    });
    local = bind(local, editor::SET_CURSOR, control, |ed, at: SetCursorArgs| {
        ed.set_cursor(at.line, at.col);
        Ok(())
    });
    local = bind(local, editor::PREPEND_KEYMAP, control, prepend_remote_keymap);
    local = bind(local, editor::REMOVE_KEYMAP, control, |ed, id: LayerId| {
        Ok(ed.remove_keymap(id))
    });
    local
}

/// All chords are parsed before the layer is added, so a bad chord leaves the
/// keymaps untouched.
fn prepend_remote_keymap(
    ed: &mut EditorControl,
    bindings: Vec<KeymapBindingArgs>,
) -> Result<LayerId, SessionError> {
    let is_mac = ed.state().settings().mac_keymap;
    let bindings = bindings
        .into_iter()
        .map(|b| {
            let binding = KeyBinding::parse(&b.chord, b.command, is_mac)?;
            Ok(if b.args.is_null() {
                binding
            } else {
                binding.with_args(b.args)
            })
        })
        .collect::<Result<Vec<_>, SessionError>>()?;
    Ok(ed.prepend_keymap(bindings).id())
}
