//! `PopupHost` over Win32: overlay creation, message boxes, the open-file
//! dialog and a minimal modal form for text prompts and item properties.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use clickdeck_core::Result;
use clickdeck_core::popup::{PopupHost, PopupSurface};
use clickdeck_types::{LauncherItem, Rect};
use tracing::debug;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::Graphics::Gdi::{COLOR_BTNFACE, DEFAULT_GUI_FONT, GetStockObject, GetSysColorBrush};
use windows::Win32::UI::Controls::Dialogs::{
    GetOpenFileNameW, OFN_ALLOWMULTISELECT, OFN_EXPLORER, OFN_FILEMUSTEXIST, OFN_NOCHANGEDIR,
    OFN_PATHMUSTEXIST, OPENFILENAMEW,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{EnableWindow, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::{
    BS_DEFPUSHBUTTON, BS_PUSHBUTTON, CreateWindowExW, DefWindowProcW, DestroyWindow,
    DispatchMessageW, ES_AUTOHSCROLL, GetCursorPos, GetForegroundWindow, GetMessageW,
    GetSystemMetrics, GetWindowTextLengthW, GetWindowTextW, HMENU, IDCANCEL, IDOK, IDYES,
    IsDialogMessageW, LoadCursorW, IDC_ARROW, MB_ICONERROR, MB_ICONINFORMATION, MB_ICONQUESTION,
    MB_OK, MB_TOPMOST, MB_YESNO, MESSAGEBOX_STYLE, MSG, MessageBoxW, PostQuitMessage,
    RegisterClassExW, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN, SW_SHOW, SendMessageW, ShowWindow, TranslateMessage, WINDOW_EX_STYLE,
    WINDOW_STYLE, WM_CLOSE, WM_COMMAND, WM_SETFONT, WNDCLASSEXW, WS_CAPTION, WS_CHILD,
    WS_EX_CLIENTEDGE, WS_EX_DLGMODALFRAME, WS_EX_TOPMOST, WS_POPUP, WS_SYSMENU, WS_TABSTOP,
    WS_VISIBLE,
};
use windows::core::{PCWSTR, PWSTR, w};

use super::{overlay, pcwstr, shell, to_wide};

const PROMPT_CLASS: PCWSTR = w!("ClickdeckPrompt");
const PROMPT_WIDTH: i32 = 340;
/// Caption and borders around the form's client area
const FRAME_HEIGHT: i32 = 40;
const LABEL_HEIGHT: i32 = 18;
const ROW_HEIGHT: i32 = 34;
/// First edit control; field `n` is `ID_EDIT + n`
const ID_EDIT: usize = 100;
/// UTF-16 units for the picked paths, enough for a few hundred files
const PICK_BUFFER_LEN: usize = 32 * 1024;
const PICK_FILTER: &str =
    "Applications (*.exe)\0*.exe\0Shortcuts (*.lnk)\0*.lnk\0All files (*.*)\0*.*\0";

pub(super) struct Win32Host {
    instance: HINSTANCE,
}

impl Win32Host {
    pub(super) fn new(instance: HINSTANCE) -> Self {
        Self { instance }
    }
}

impl PopupHost for Win32Host {
    fn create_surface(&mut self, frame: Rect) -> Result<Box<dyn PopupSurface>> {
        overlay::create(self.instance, frame)
    }

    fn virtual_screen(&self) -> Rect {
        let metric = |index| f64::from(unsafe { GetSystemMetrics(index) });
        Rect::new(
            metric(SM_XVIRTUALSCREEN),
            metric(SM_YVIRTUALSCREEN),
            metric(SM_CXVIRTUALSCREEN),
            metric(SM_CYVIRTUALSCREEN),
        )
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        message_box(title, message, MB_YESNO | MB_ICONQUESTION) == IDYES.0
    }

    fn prompt_text(&mut self, title: &str, initial: &str) -> Option<String> {
        form(self.instance, title, &[("", initial)])?.pop()
    }

    fn pick_files(&mut self, title: &str) -> Vec<PathBuf> {
        pick_files(title)
    }

    fn resolve_shortcut(&self, path: &Path) -> Option<PathBuf> {
        shell::resolve_shortcut(path)
    }

    fn edit_item(&mut self, item: &LauncherItem) -> Option<LauncherItem> {
        let values = form(
            self.instance,
            &format!("Properties of {}", item.display_name),
            &[
                ("Name", item.display_name.as_str()),
                ("Program", item.executable_path.as_str()),
                ("Arguments", item.arguments.as_str()),
                ("Icon", item.icon_path.as_str()),
                ("Start in", item.working_directory.as_str()),
            ],
        )?;
        let [name, program, arguments, icon, directory] = <[String; 5]>::try_from(values).ok()?;
        Some(LauncherItem {
            display_name: name.trim().to_string(),
            executable_path: program.trim().to_string(),
            arguments,
            icon_path: icon.trim().to_string(),
            working_directory: directory.trim().to_string(),
            ..item.clone()
        })
    }

    fn report_error(&mut self, title: &str, message: &str) {
        message_box(title, message, MB_OK | MB_ICONERROR);
    }
}

pub(super) fn show_info(title: &str, message: &str) {
    message_box(title, message, MB_OK | MB_ICONINFORMATION);
}

fn pick_files(title: &str) -> Vec<PathBuf> {
    let title_w = to_wide(title);
    let filter_w = to_wide(PICK_FILTER);
    let mut buffer = vec![0u16; PICK_BUFFER_LEN];

    #[allow(clippy::cast_possible_truncation)] // struct size and buffer length
    let mut dialog = OPENFILENAMEW {
        lStructSize: size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: unsafe { GetForegroundWindow() },
        lpstrFilter: pcwstr(&filter_w),
        nFilterIndex: 1,
        lpstrFile: PWSTR(buffer.as_mut_ptr()),
        nMaxFile: buffer.len() as u32,
        lpstrTitle: pcwstr(&title_w),
        Flags: OFN_ALLOWMULTISELECT
            | OFN_EXPLORER
            | OFN_FILEMUSTEXIST
            | OFN_PATHMUSTEXIST
            | OFN_NOCHANGEDIR,
        ..Default::default()
    };
    if !unsafe { GetOpenFileNameW(&mut dialog) }.as_bool() {
        debug!("File picker cancelled");
        return Vec::new();
    }
    let picked = split_picked(&buffer);
    debug!("Picked {} files", picked.len());
    picked
}

/// Decode the picker's buffer: a lone full path, or the directory followed
/// by the selected file names, each null-terminated.
fn split_picked(buffer: &[u16]) -> Vec<PathBuf> {
    let parts: Vec<String> = buffer
        .split(|&c| c == 0)
        .take_while(|part| !part.is_empty())
        .map(String::from_utf16_lossy)
        .collect();
    match parts.as_slice() {
        [] => Vec::new(),
        [single] => vec![PathBuf::from(single)],
        [dir, names @ ..] => names.iter().map(|name| Path::new(dir).join(name)).collect(),
    }
}

fn message_box(title: &str, message: &str, style: MESSAGEBOX_STYLE) -> i32 {
    let title_w = to_wide(title);
    let message_w = to_wide(message);
    unsafe {
        let owner = GetForegroundWindow();
        MessageBoxW(
            owner,
            pcwstr(&message_w),
            pcwstr(&title_w),
            style | MB_TOPMOST,
        )
        .0
    }
}

struct PromptState {
    edits: Vec<HWND>,
    /// `Some` once the form is answered; the inner value holds the fields on OK
    answer: Option<Option<Vec<String>>>,
}

thread_local! {
    static PROMPT: RefCell<Option<PromptState>> = const { RefCell::new(None) };
}

pub(super) fn register_prompt_class(instance: HINSTANCE) -> windows::core::Result<()> {
    #[allow(clippy::cast_possible_truncation)] // struct size
    let size = size_of::<WNDCLASSEXW>() as u32;
    let class = WNDCLASSEXW {
        cbSize: size,
        lpfnWndProc: Some(prompt_proc),
        hInstance: instance,
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
        hbrBackground: unsafe { GetSysColorBrush(COLOR_BTNFACE) },
        lpszClassName: PROMPT_CLASS,
        ..Default::default()
    };
    if unsafe { RegisterClassExW(&class) } == 0 {
        return Err(windows::core::Error::from_win32());
    }
    Ok(())
}

/// Run a modal form with one single-line edit per `(label, initial)` field.
/// `None` when cancelled; otherwise the fields' text in order.
fn form(instance: HINSTANCE, title: &str, fields: &[(&str, &str)]) -> Option<Vec<String>> {
    let title_w = to_wide(title);
    let field_rows: i32 = fields
        .iter()
        .map(|(label, _)| if label.is_empty() { ROW_HEIGHT } else { ROW_HEIGHT + LABEL_HEIGHT })
        .sum();
    let height = 14 + field_rows + 38 + FRAME_HEIGHT;

    let owner = unsafe { GetForegroundWindow() };
    let mut cursor = POINT::default();
    let _ = unsafe { GetCursorPos(&mut cursor) };

    let hwnd = unsafe {
        CreateWindowExW(
            WS_EX_DLGMODALFRAME | WS_EX_TOPMOST,
            PROMPT_CLASS,
            pcwstr(&title_w),
            WS_POPUP | WS_CAPTION | WS_SYSMENU,
            cursor.x - PROMPT_WIDTH / 2,
            cursor.y - height / 2,
            PROMPT_WIDTH,
            height,
            owner,
            None,
            instance,
            None,
        )
    }
    .ok()?;

    let child = |ex: WINDOW_EX_STYLE, class: PCWSTR, text: PCWSTR, style: WINDOW_STYLE, rect: (i32, i32, i32, i32), id: usize| unsafe {
        CreateWindowExW(
            ex,
            class,
            text,
            WS_CHILD | WS_VISIBLE | style,
            rect.0,
            rect.1,
            rect.2,
            rect.3,
            hwnd,
            HMENU(id as *mut _),
            instance,
            None,
        )
    };

    let mut controls = Vec::new();
    let mut edits = Vec::new();
    let mut y = 14;
    for (n, (label, initial)) in fields.iter().enumerate() {
        if !label.is_empty() {
            let label_w = to_wide(label);
            controls.extend(child(
                WINDOW_EX_STYLE(0),
                w!("STATIC"),
                pcwstr(&label_w),
                WINDOW_STYLE(0),
                (12, y, 300, LABEL_HEIGHT - 2),
                0,
            ));
            y += LABEL_HEIGHT;
        }
        let initial_w = to_wide(initial);
        #[allow(clippy::cast_sign_loss)] // control style bits
        let edit = child(
            WS_EX_CLIENTEDGE,
            w!("EDIT"),
            pcwstr(&initial_w),
            WS_TABSTOP | WINDOW_STYLE(ES_AUTOHSCROLL as u32),
            (12, y, 300, 24),
            ID_EDIT + n,
        );
        let Ok(edit) = edit else {
            let _ = unsafe { DestroyWindow(hwnd) };
            return None;
        };
        edits.push(edit);
        controls.push(edit);
        y += ROW_HEIGHT;
    }

    #[allow(clippy::cast_sign_loss)] // control style bits
    let ok = child(
        WINDOW_EX_STYLE(0),
        w!("BUTTON"),
        w!("OK"),
        WS_TABSTOP | WINDOW_STYLE(BS_DEFPUSHBUTTON as u32),
        (146, y + 4, 80, 26),
        IDOK.0.cast_unsigned() as usize,
    );
    #[allow(clippy::cast_sign_loss)] // control style bits
    let cancel = child(
        WINDOW_EX_STYLE(0),
        w!("BUTTON"),
        w!("Cancel"),
        WS_TABSTOP | WINDOW_STYLE(BS_PUSHBUTTON as u32),
        (232, y + 4, 80, 26),
        IDCANCEL.0.cast_unsigned() as usize,
    );
    controls.extend([ok, cancel].into_iter().flatten());

    let font = unsafe { GetStockObject(DEFAULT_GUI_FONT) };
    for control in controls {
        unsafe {
            SendMessageW(control, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
        }
    }

    let first = edits.first().copied();
    PROMPT.with(|state| {
        *state.borrow_mut() = Some(PromptState { edits, answer: None });
    });

    unsafe {
        let _ = EnableWindow(owner, false);
        let _ = ShowWindow(hwnd, SW_SHOW);
        if let Some(first) = first {
            let _ = SetFocus(first);
        }
    }

    let mut msg = MSG::default();
    while !answered() {
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if status.0 <= 0 {
            if status.0 == 0 {
                // Hand WM_QUIT back to the outer loop
                #[allow(clippy::cast_possible_truncation)] // exit code
                unsafe {
                    PostQuitMessage(msg.wParam.0 as i32);
                }
            }
            break;
        }
        unsafe {
            if !IsDialogMessageW(hwnd, &msg).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    unsafe {
        let _ = EnableWindow(owner, true);
        let _ = DestroyWindow(hwnd);
    }
    let answer = PROMPT.with(|state| state.borrow_mut().take().and_then(|s| s.answer.flatten()));
    debug!("Form '{title}' {}", if answer.is_some() { "accepted" } else { "cancelled" });
    answer
}

fn answered() -> bool {
    PROMPT.with(|state| {
        state
            .borrow()
            .as_ref()
            .is_none_or(|s| s.answer.is_some())
    })
}

fn answer(values: Option<Vec<String>>) {
    PROMPT.with(|state| {
        if let Some(s) = state.borrow_mut().as_mut() {
            s.answer = Some(values);
        }
    });
}

fn edit_text(edit: HWND) -> String {
    let len = unsafe { GetWindowTextLengthW(edit) };
    let mut buffer = vec![0u16; usize::try_from(len).unwrap_or(0) + 1];
    let copied = unsafe { GetWindowTextW(edit, &mut buffer) };
    buffer.truncate(usize::try_from(copied).unwrap_or(0));
    String::from_utf16_lossy(&buffer)
}

unsafe extern "system" fn prompt_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_COMMAND => {
            #[allow(clippy::cast_possible_truncation)] // LOWORD
            let id = i32::from(wparam.0 as u16);
            if id == IDOK.0 {
                let edits = PROMPT.with(|state| state.borrow().as_ref().map(|s| s.edits.clone()));
                answer(edits.map(|edits| edits.into_iter().map(edit_text).collect()));
            } else if id == IDCANCEL.0 {
                answer(None);
            }
            LRESULT(0)
        }
        WM_CLOSE => {
            answer(None);
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
