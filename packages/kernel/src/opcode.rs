//! The instruction set.

use crate::error::KernelError;

macro_rules! opcodes {
    ($($name:ident = $code:literal => $mnemonic:literal,)*) => {
        /// A one-byte instruction tag.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $code,)*
        }

        impl Opcode {
            /// Assembly mnemonic, as used in diagnostics.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic,)*
                }
            }
        }

        impl TryFrom<u8> for Opcode {
            type Error = KernelError;

            fn try_from(byte: u8) -> Result<Self, KernelError> {
                match byte {
                    $($code => Ok(Opcode::$name),)*
                    other => Err(KernelError::UnknownOpcode(other)),
                }
            }
        }
    };
}

opcodes! {
    Char = 1 => "CHAR",
    Int = 2 => "INT",
    String = 3 => "STRING",
    Float = 4 => "FLOAT",
    Set = 5 => "SET",
    Get = 6 => "GET",
    Increment = 7 => "INCREMENT",
    Decrement = 8 => "DECREMENT",
    Plus = 9 => "PLUS",
    Minus = 10 => "MINUS",
    Times = 11 => "TIMES",
    DividedBy = 12 => "DIVIDEDBY",
    Modulus = 13 => "MODULUS",
    UnaryMinus = 14 => "UNARYMINUS",
    Equals = 15 => "EQUALS",
    NotEquals = 16 => "NOTEQUALS",
    LessThan = 17 => "LESSTHAN",
    LessThanOrEquals = 18 => "LESSTHANOREQUALS",
    GreaterThan = 19 => "GREATERTHAN",
    GreaterThanOrEquals = 20 => "GREATERTHANOREQUALS",
    LogicalAnd = 21 => "LOGICALAND",
    LogicalOr = 22 => "LOGICALOR",
    LogicalXor = 23 => "LOGICALXOR",
    LogicalNot = 24 => "LOGICALNOT",
    BitwiseAnd = 25 => "BITWISEAND",
    BitwiseOr = 26 => "BITWISEOR",
    BitwiseXor = 27 => "BITWISEXOR",
    BitwiseNot = 28 => "BITWISENOT",
    ToChar = 29 => "TOCHAR",
    ToInt = 30 => "TOINT",
    ToFloat = 31 => "TOFLOAT",
    Round = 32 => "ROUND",
    Floor = 33 => "FLOOR",
    Ceil = 34 => "CEIL",
    Min = 35 => "MIN",
    Max = 36 => "MAX",
    Abs = 37 => "ABS",
    Constrain = 38 => "CONSTRAIN",
    Map = 39 => "MAP",
    Pow = 40 => "POW",
    Sq = 41 => "SQ",
    Sqrt = 42 => "SQRT",
    Delay = 43 => "DELAY",
    DelayUntil = 44 => "DELAYUNTIL",
    Millis = 45 => "MILLIS",
    PinMode = 46 => "PINMODE",
    AnalogRead = 47 => "ANALOGREAD",
    AnalogWrite = 48 => "ANALOGWRITE",
    DigitalRead = 49 => "DIGITALREAD",
    DigitalWrite = 50 => "DIGITALWRITE",
    Print = 51 => "PRINT",
    PrintLn = 52 => "PRINTLN",
    Open = 53 => "OPEN",
    Close = 54 => "CLOSE",
    Write = 55 => "WRITE",
    ReadInt = 56 => "READINT",
    ReadChar = 57 => "READCHAR",
    ReadFloat = 58 => "READFLOAT",
    ReadString = 59 => "READSTRING",
    If = 128 => "IF",
    Else = 129 => "ELSE",
    EndIf = 130 => "ENDIF",
    While = 131 => "WHILE",
    EndWhile = 132 => "ENDWHILE",
    Loop = 133 => "LOOP",
    EndLoop = 134 => "ENDLOOP",
    Stop = 135 => "STOP",
    Fork = 136 => "FORK",
    WaitUntilDone = 137 => "WAITUNTILDONE",
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}
