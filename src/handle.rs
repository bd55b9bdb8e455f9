// ── Marshalled handles ────────────────────────────────────────────────────────
//
// Java has no pointer type, so every open file or device crosses the JNI
// boundary as a `byte[]` holding the raw handle bits.  The byte order is the
// platform's own; the array never leaves the process.

/// Width in bytes of a marshalled handle: the native pointer width.
pub const HANDLE_WIDTH: usize = std::mem::size_of::<usize>();

/// An opaque OS handle as carried across the JNI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleToken(usize);

impl HandleToken {
    /// `INVALID_HANDLE_VALUE`: every bit set.
    pub const INVALID: Self = Self(usize::MAX);

    pub fn from_raw(bits: usize) -> Self {
        Self(bits)
    }

    pub fn into_raw(self) -> usize {
        self.0
    }

    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }

    /// The marshalled form handed to Java.
    pub fn to_bytes(self) -> [u8; HANDLE_WIDTH] {
        self.0.to_ne_bytes()
    }

    /// Rebuild a token from its marshalled form.
    ///
    /// Anything that is not exactly `HANDLE_WIDTH` bytes long decodes to
    /// [`HandleToken::INVALID`], so the OS rejects it with
    /// `ERROR_INVALID_HANDLE` instead of us reading past the buffer.
    pub fn from_bytes(buf: &[u8]) -> Self {
        <[u8; HANDLE_WIDTH]>::try_from(buf)
            .map(|bytes| Self(usize::from_ne_bytes(bytes)))
            .unwrap_or(Self::INVALID)
    }

    /// Rebuild a token from the contents of a Java `byte[]`.
    ///
    /// `None` stands for a null array and decodes to
    /// [`HandleToken::INVALID`], like any other malformed handle.
    pub fn from_java_bytes(buf: Option<&[i8]>) -> Self {
        match buf {
            Some(signed) => {
                let bytes: Vec<u8> = signed.iter().map(|&b| b as u8).collect();
                Self::from_bytes(&bytes)
            }
            None => Self::INVALID,
        }
    }
}

#[cfg(windows)]
impl From<windows::Win32::Foundation::HANDLE> for HandleToken {
    fn from(h: windows::Win32::Foundation::HANDLE) -> Self {
        Self(h.0 as usize)
    }
}

#[cfg(windows)]
impl From<HandleToken> for windows::Win32::Foundation::HANDLE {
    fn from(t: HandleToken) -> Self {
        Self(t.0 as *mut core::ffi::c_void)
    }
}
